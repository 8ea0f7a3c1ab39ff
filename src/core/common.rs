// explicit identifiers for the parts of the installation, used in errors and result columns

use strum::Display;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ComponentId {
    #[strum(serialize = "simulation request")]
    Request,
    #[strum(serialize = "solar collector")]
    SolarCollector,
    #[strum(serialize = "circulation pump")]
    CirculationPump,
    #[strum(serialize = "storage tank")]
    StorageTank,
}
