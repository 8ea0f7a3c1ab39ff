pub mod auxiliary_heater;
pub mod circulation_pump;
pub mod solar_collector;
pub mod storage_tank;
