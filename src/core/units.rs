pub const SECONDS_PER_MINUTE: u32 = 60;
pub const MINUTES_PER_HOUR: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const JOULES_PER_KILOWATT_HOUR: u32 = 3_600_000;

/// Energy, in J, delivered over one hour by a constant power in W.
pub fn joules_over_one_hour(power_watts: f64) -> f64 {
    power_watts * SECONDS_PER_HOUR as f64
}

/// Volume, in litres, moved over one hour at a flow rate given in litres/minute.
pub fn litres_over_one_hour(flow_rate_litres_per_minute: f64) -> f64 {
    flow_rate_litres_per_minute * MINUTES_PER_HOUR as f64
}

pub fn joules_to_kilowatt_hours(joules: f64) -> f64 {
    joules / JOULES_PER_KILOWATT_HOUR as f64
}
