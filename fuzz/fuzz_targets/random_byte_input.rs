#![no_main]

use chrono::{Duration, NaiveDate};
use libfuzzer_sys::fuzz_target;
use solar_thermal_sim::external_conditions::{WeatherSample, WeatherSeries};
use solar_thermal_sim::output::VecResultSink;
use solar_thermal_sim::read_weather_file::{FixedLocation, Location};
use solar_thermal_sim::{run_simulation_to_sink, StopHandle};
use std::io::{BufReader, Cursor};
use std::sync::LazyLock;

// a year of hourly weather with a daily bell of irradiance, so that well-formed requests get to run
static WEATHER: LazyLock<WeatherSeries> = LazyLock::new(|| {
    let start = NaiveDate::from_ymd_opt(2003, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    WeatherSeries::new(
        (0..8760)
            .map(|hour| {
                let hour_of_day = (hour % 24) as f64;
                let irradiance = (800. - 50. * (hour_of_day - 12.).powi(2)).max(0.);
                WeatherSample::new(start + Duration::hours(hour), irradiance)
            })
            .collect(),
    )
    .unwrap()
});

fuzz_target!(|data: &[u8]| {
    let mut sink = VecResultSink::default();
    let _run = run_simulation_to_sink(
        BufReader::new(Cursor::new(data)),
        &mut sink,
        &FixedLocation(Location {
            latitude: 51.5,
            longitude: -0.1,
        }),
        &*WEATHER,
        &StopHandle::new(),
    );
});
