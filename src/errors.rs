use crate::core::common::ComponentId;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Request was considered invalid due to error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Physically inconsistent state reached during hour {hour} ({timestamp}): {source}")]
    PhysicalInconsistency {
        hour: usize,
        timestamp: NaiveDateTime,
        #[source]
        source: PhysicalInconsistencyError,
    },
    #[error("Could not obtain the data needed for the simulation: {0}")]
    UpstreamData(#[from] UpstreamDataError),
    #[error("Error writing out simulation results: {0}")]
    ResultSink(anyhow::Error),
}

/// Bad or missing input, always attributed to the component it configures.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("invalid configuration for {component}: {message}")]
pub struct ConfigurationError {
    component: ComponentId,
    message: String,
}

impl ConfigurationError {
    pub(crate) fn new(component: ComponentId, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PhysicalInconsistencyError {
    #[error("retrograde heat flow into the {component}: water in pipes at {temp_in_pipes}ºC is colder than the tank average of {tank_average_temp}ºC", component = ComponentId::StorageTank)]
    RetrogradeHeatFlow {
        temp_in_pipes: f64,
        tank_average_temp: f64,
    },
}

impl PhysicalInconsistencyError {
    pub fn component(&self) -> ComponentId {
        match self {
            PhysicalInconsistencyError::RetrogradeHeatFlow { .. } => ComponentId::StorageTank,
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamDataError {
    #[error("Address could not be resolved to a location: {0}")]
    AddressNotFound(String),
    #[error("Weather data is unavailable: {0}")]
    WeatherUnavailable(String),
    #[error("Weather data is malformed: {0}")]
    MalformedWeatherData(String),
    #[error("Simulation needs {required} hours of weather data but only {available} are available")]
    InsufficientWeatherData { required: usize, available: usize },
}
