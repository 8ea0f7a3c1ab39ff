/// An object to represent the fallback (boiler) heater that keeps the storage tank at its minimum
/// safe temperature when solar input cannot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuxiliaryHeater {
    efficiency: f64,
}

impl AuxiliaryHeater {
    /// Arguments:
    /// * `efficiency` - fraction (greater than 0, at most 1) of the heater's fuel energy that
    ///                  reaches the water
    pub fn new(efficiency: f64) -> Self {
        Self { efficiency }
    }

    /// Energy consumed by the heater to cover an energy balance, in J.
    ///
    /// Returns None when the balance shows no deficit and the heater stays off. Otherwise the
    /// returned value carries the sign of the deficit (negative), with its magnitude inflated by
    /// the heater's inefficiency.
    pub fn energy_to_cover(&self, energy_surplus: f64) -> Option<f64> {
        if energy_surplus < 0. {
            Some(energy_surplus / self.efficiency)
        } else {
            None
        }
    }
}
