pub mod core;
pub mod engine;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod output;
pub mod read_weather_file;
mod simulation_time;
mod statistics;

#[cfg(test)]
mod tests;

pub use crate::engine::{RunOutcome, RunSummary, SimulationEngine, StopHandle};
pub use crate::errors::{
    ConfigurationError, PhysicalInconsistencyError, SimulationError, UpstreamDataError,
};
use crate::input::ingest_request;
use crate::output::{CsvResultSink, Output, ResultSink};
use crate::read_weather_file::{Geocoder, WeatherProvider};
use chrono::Utc;
use std::io::Read;
use tracing::info;

pub const RESULTS_FILE_TEMPLATE: &str = "{}_hourly_results.csv";

/// Run a simulation from a JSON request, writing the hourly results as CSV to the output under the
/// simulation's uuid.
pub fn run_simulation(
    input: impl Read,
    output: impl Output,
    geocoder: &impl Geocoder,
    weather_provider: &impl WeatherProvider,
    stop: &StopHandle,
) -> Result<RunSummary, SimulationError> {
    let request = ingest_request(input)?;

    let writer = output
        .writer_for_location_key(&request.uuid)
        .map_err(SimulationError::ResultSink)?;
    let mut sink = CsvResultSink::new(writer);

    run_request(&request, &mut sink, geocoder, weather_provider, stop)
}

/// Run a simulation from a JSON request, handing the hourly results to the given sink.
pub fn run_simulation_to_sink(
    input: impl Read,
    sink: &mut impl ResultSink,
    geocoder: &impl Geocoder,
    weather_provider: &impl WeatherProvider,
    stop: &StopHandle,
) -> Result<RunSummary, SimulationError> {
    let request = ingest_request(input)?;

    run_request(&request, sink, geocoder, weather_provider, stop)
}

fn run_request(
    request: &input::SimulationRequest,
    sink: &mut impl ResultSink,
    geocoder: &impl Geocoder,
    weather_provider: &impl WeatherProvider,
    stop: &StopHandle,
) -> Result<RunSummary, SimulationError> {
    let location = geocoder.resolve(&request.address)?;
    let start_date = request
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive());
    info!(
        "Simulating {} at ({}, {}) from {start_date}",
        request.address, location.latitude, location.longitude
    );

    let weather_series = weather_provider.fetch(
        location.latitude,
        location.longitude,
        start_date,
        request.weather_lookback_years,
    )?;
    if weather_series.is_empty() {
        return Err(UpstreamDataError::WeatherUnavailable(format!(
            "no weather available for ({}, {})",
            location.latitude, location.longitude
        ))
        .into());
    }

    let mut engine = SimulationEngine::new(request, weather_series)?;
    let summary = engine.run(sink, stop)?;
    sink.finalize().map_err(SimulationError::ResultSink)?;

    Ok(summary)
}
