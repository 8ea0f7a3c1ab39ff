use crate::core::common::ComponentId;
use crate::external_conditions::{WeatherSample, WeatherSeries};
use crate::output::{FileOutput, SinkOutput, VecResultSink};
use crate::read_weather_file::{
    FileWeatherProvider, FixedLocation, Location, TableGeocoder, WeatherFileFormat,
};
use crate::{
    run_simulation, run_simulation_to_sink, RunOutcome, SimulationError, StopHandle,
    UpstreamDataError, RESULTS_FILE_TEMPLATE,
};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

const ADDRESS: &str = "1 Sunny Street, Springfield";

#[fixture]
fn request_json() -> Value {
    let consumption_pattern: serde_json::Map<String, Value> = (0..24)
        .map(|hour| {
            let water_used = if (6..=8).contains(&hour) || (18..=21).contains(&hour) {
                20
            } else {
                0
            };
            (
                format!("{hour:02}:00"),
                json!({"water_used": water_used, "average_temperature_of_water_used": 45}),
            )
        })
        .collect();

    json!({
        "address": ADDRESS,
        "optional_date_of_simulation": "10-March-2023",
        "simulation_uuid": "integration-test",
        "num_hours_to_simulate": 48,
        "solar": {"length": 4.5, "width": 2, "solar_efficiency": 0.15},
        "water_pump": {
            "max_flow_rate": 20,
            "maximum_temp_difference_between_water_incoming_and_outgoing_solar": 4,
            "minimum_temp_difference_between_water_incoming_and_outgoing_solar": 2,
            "min_flow_rate": 1.5
        },
        "water_container": {
            "water_capacity": 200,
            "percent_of_thermal_energy_absorbed_from_pipes": 0.85,
            "percent_of_thermal_energy_lost_to_waste_per_hour": 0.02,
            "temperature_of_external_water_source": 7,
            "efficiency_of_traditional_boiler": 0.75,
            "minimum_average_water_temperature": 50,
            "consumption_pattern": consumption_pattern
        }
    })
}

#[fixture]
fn geocoder() -> TableGeocoder {
    TableGeocoder::from_json(
        json!({ADDRESS: {"latitude": 39.8, "longitude": -89.6}})
            .to_string()
            .as_bytes(),
    )
    .unwrap()
}

/// Three days of early March in each of two years, with a bell of irradiance around noon
#[fixture]
fn weather_series() -> WeatherSeries {
    let samples = [2003, 2004]
        .into_iter()
        .flat_map(|year| {
            let start = NaiveDate::from_ymd_opt(year, 3, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            (0..72).map(move |hour| {
                let hour_of_day = (hour % 24) as f64;
                let irradiance = (700. - 60. * (hour_of_day - 12.).powi(2)).max(0.);
                WeatherSample::new(start + Duration::hours(hour), irradiance)
            })
        })
        .collect();

    WeatherSeries::new(samples).unwrap()
}

#[rstest]
fn should_run_request_end_to_end(
    request_json: Value,
    geocoder: TableGeocoder,
    weather_series: WeatherSeries,
) {
    let mut sink = VecResultSink::default();

    let summary = run_simulation_to_sink(
        request_json.to_string().as_bytes(),
        &mut sink,
        &geocoder,
        &weather_series,
        &StopHandle::new(),
    )
    .unwrap();

    assert_eq!(summary.simulation_uuid, "integration-test");
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.hours_simulated, 48);
    assert!(summary.total_energy_captured_by_solar > 0.);
    assert!(sink.is_finalized());
    assert_eq!(sink.rows().len(), 48);
    assert_eq!(
        sink.rows()[0].timestamp,
        NaiveDate::from_ymd_opt(2023, 3, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[rstest]
fn should_fail_for_unknown_address(request_json: Value, weather_series: WeatherSeries) {
    let result = run_simulation(
        request_json.to_string().as_bytes(),
        SinkOutput,
        &TableGeocoder::default(),
        &weather_series,
        &StopHandle::new(),
    );

    assert!(matches!(
        result,
        Err(SimulationError::UpstreamData(UpstreamDataError::AddressNotFound(address))) if address == ADDRESS
    ));
}

#[rstest]
fn should_fail_without_weather(request_json: Value, geocoder: TableGeocoder) {
    let result = run_simulation(
        request_json.to_string().as_bytes(),
        SinkOutput,
        &geocoder,
        &WeatherSeries::new(vec![]).unwrap(),
        &StopHandle::new(),
    );

    assert!(matches!(
        result,
        Err(SimulationError::UpstreamData(
            UpstreamDataError::WeatherUnavailable(_)
        ))
    ));
}

#[rstest]
fn should_name_component_of_invalid_request(
    mut request_json: Value,
    geocoder: TableGeocoder,
    weather_series: WeatherSeries,
) {
    request_json["water_pump"]["max_flow_rate"] = json!(-5);

    let result = run_simulation(
        request_json.to_string().as_bytes(),
        SinkOutput,
        &geocoder,
        &weather_series,
        &StopHandle::new(),
    );

    match result {
        Err(SimulationError::Configuration(err)) => {
            assert_eq!(err.component(), ComponentId::CirculationPump)
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

fn write_open_meteo_file(
    directory: &Path,
    weather_series: &WeatherSeries,
    unread_hours: &[usize],
) -> PathBuf {
    fs::create_dir_all(directory).unwrap();

    let (times, irradiances): (Vec<_>, Vec<_>) = weather_series
        .samples()
        .iter()
        .enumerate()
        .map(|(idx, sample)| {
            (
                sample.timestamp.format("%Y-%m-%dT%H:%M").to_string(),
                if unread_hours.contains(&idx) {
                    None
                } else {
                    sample.direct_normal_irradiance
                },
            )
        })
        .unzip();
    let weather_file = directory.join("open_meteo.json");
    fs::write(
        &weather_file,
        json!({"hourly": {"time": times, "direct_normal_irradiance": irradiances}}).to_string(),
    )
    .unwrap();

    weather_file
}

#[rstest]
fn should_write_csv_results_from_weather_file(request_json: Value, weather_series: WeatherSeries) {
    let directory = std::env::temp_dir().join("solar-thermal-sim-csv-results-test");
    let weather_file = write_open_meteo_file(&directory, &weather_series, &[]);

    let summary = run_simulation(
        request_json.to_string().as_bytes(),
        FileOutput::new(directory.clone(), RESULTS_FILE_TEMPLATE.to_string()),
        &FixedLocation(Location {
            latitude: 39.8,
            longitude: -89.6,
        }),
        &FileWeatherProvider::new(weather_file, WeatherFileFormat::OpenMeteo),
        &StopHandle::new(),
    )
    .unwrap();

    let results =
        fs::read_to_string(directory.join("integration-test_hourly_results.csv")).unwrap();
    assert_eq!(summary.hours_simulated, 48);
    // headings and units, then a row per hour
    assert_eq!(results.lines().count(), 50);
    assert!(results.starts_with("simulation_uuid,timestamp,direct_normal_irradiance"));
}

#[rstest]
fn should_simulate_every_hour_when_weather_file_has_gaps(
    request_json: Value,
    weather_series: WeatherSeries,
) {
    let directory = std::env::temp_dir().join("solar-thermal-sim-weather-gap-test");
    let weather_file = write_open_meteo_file(&directory, &weather_series, &[1, 30]);
    let mut sink = VecResultSink::default();

    let summary = run_simulation_to_sink(
        request_json.to_string().as_bytes(),
        &mut sink,
        &FixedLocation(Location {
            latitude: 39.8,
            longitude: -89.6,
        }),
        &FileWeatherProvider::new(weather_file, WeatherFileFormat::OpenMeteo),
        &StopHandle::new(),
    )
    .unwrap();

    assert_eq!(summary.hours_simulated, 48);
    let start = NaiveDate::from_ymd_opt(2023, 3, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    for (i, row) in sink.rows().iter().enumerate() {
        assert_eq!(row.timestamp, start + Duration::hours(i as i64));
    }
}
