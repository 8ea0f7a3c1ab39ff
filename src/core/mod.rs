pub mod common;
pub mod heating_systems;
pub mod material_properties;
pub mod units;
pub mod water_heat_demand;
