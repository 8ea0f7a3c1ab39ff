use crate::core::common::ComponentId;
use crate::core::water_heat_demand::consumption_pattern::{
    format_times_of_day, parse_time_of_day, ConsumptionPattern,
};
use crate::errors::ConfigurationError;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_valid::Validate;
use std::io::{BufReader, Read};
use tracing::warn;

const DEFAULT_WEATHER_LOOKBACK_YEARS: u32 = 20;

// dates arrive like "10-March-2023", but ISO dates are accepted too
const REQUEST_DATE_FORMATS: [&str; 2] = ["%d-%B-%Y", "%Y-%m-%d"];

pub fn ingest_request(json: impl Read) -> Result<SimulationRequest, ConfigurationError> {
    let reader = BufReader::new(json);

    let value: Value = serde_json::from_reader(reader).map_err(|err| {
        ConfigurationError::new(
            ComponentId::Request,
            format!("request is not valid JSON: {err}"),
        )
    })?;

    let request: SimulationRequest =
        serde_json::from_value(value.clone()).map_err(|err| attribute_shape_error(&value, err))?;

    validate_request(&request)?;

    Ok(request)
}

/// Work out which component a deserialization failure belongs to by re-reading each component's
/// section on its own. Anything not found in a component section is put down to the request itself.
fn attribute_shape_error(value: &Value, err: serde_json::Error) -> ConfigurationError {
    fn section_error<T: for<'de> Deserialize<'de>>(
        value: &Value,
        key: &str,
    ) -> Option<serde_json::Error> {
        value
            .get(key)
            .and_then(|section| serde_json::from_value::<T>(section.clone()).err())
    }

    let section_errors = [
        (
            ComponentId::SolarCollector,
            "solar",
            section_error::<SolarInput>(value, "solar"),
        ),
        (
            ComponentId::CirculationPump,
            "water_pump",
            section_error::<WaterPumpInput>(value, "water_pump"),
        ),
        (
            ComponentId::StorageTank,
            "water_container",
            section_error::<WaterContainerInput>(value, "water_container"),
        ),
    ];

    section_errors
        .into_iter()
        .find_map(|(component, key, section_err)| {
            section_err.map(|section_err| {
                ConfigurationError::new(component, format!("'{key}' section: {section_err}"))
            })
        })
        .unwrap_or_else(|| ConfigurationError::new(ComponentId::Request, err.to_string()))
}

pub(crate) fn validate_request(request: &SimulationRequest) -> Result<(), ConfigurationError> {
    fn check(component: ComponentId, validated: &impl Validate) -> Result<(), ConfigurationError> {
        validated
            .validate()
            .map_err(|errors| ConfigurationError::new(component, errors.to_string()))
    }

    check(ComponentId::Request, request)?;
    if request.address.trim().is_empty() {
        return Err(ConfigurationError::new(
            ComponentId::Request,
            "address must not be empty",
        ));
    }
    if request.uuid.trim().is_empty() {
        return Err(ConfigurationError::new(
            ComponentId::Request,
            "simulation_uuid must not be empty",
        ));
    }

    check(ComponentId::SolarCollector, &request.solar)?;

    let pump = &request.water_pump;
    check(ComponentId::CirculationPump, pump)?;
    if pump.min_flow_rate > pump.max_flow_rate {
        return Err(ConfigurationError::new(
            ComponentId::CirculationPump,
            format!(
                "min_flow_rate ({}) must not exceed max_flow_rate ({})",
                pump.min_flow_rate, pump.max_flow_rate
            ),
        ));
    }
    if pump.min_temp_difference > pump.max_temp_difference {
        return Err(ConfigurationError::new(
            ComponentId::CirculationPump,
            format!(
                "minimum temperature difference ({}) must not exceed maximum temperature difference ({})",
                pump.min_temp_difference, pump.max_temp_difference
            ),
        ));
    }

    if pump.min_flow_rate == 0. {
        warn!(
            "{}: min_flow_rate is 0 litres/minute, so the pump starts stopped and can never speed up; no solar heat will reach the tank",
            ComponentId::CirculationPump
        );
    }

    let container = &request.water_container;
    check(ComponentId::StorageTank, container)?;
    for (time_of_day, one_hour) in &container.consumption_pattern {
        parse_time_of_day(time_of_day)?;
        if one_hour.water_used < 0. {
            return Err(ConfigurationError::new(
                ComponentId::StorageTank,
                format!("water_used at {time_of_day} must not be negative"),
            ));
        }
    }
    let consumption_pattern = ConsumptionPattern::from_input(&container.consumption_pattern)?;
    let missing_hours = consumption_pattern.missing_hours();
    if !missing_hours.is_empty() {
        return Err(ConfigurationError::new(
            ComponentId::StorageTank,
            format!(
                "consumption pattern has no entry for {}",
                format_times_of_day(&missing_hours)
            ),
        ));
    }

    Ok(())
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct SimulationRequest {
    pub address: String,
    #[serde(
        rename = "optional_date_of_simulation",
        default,
        deserialize_with = "deserialize_optional_date"
    )]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "simulation_uuid")]
    pub uuid: String,
    #[validate(minimum = 1)]
    pub num_hours_to_simulate: usize,
    /// Number of years of history averaged over, which is also how far historical timestamps are
    /// moved forward to land on contemporary dates
    #[serde(default = "default_weather_lookback_years")]
    #[validate(minimum = 1)]
    #[validate(maximum = 100)]
    pub weather_lookback_years: u32,
    pub solar: SolarInput,
    pub water_pump: WaterPumpInput,
    pub water_container: WaterContainerInput,
}

fn default_weather_lookback_years() -> u32 {
    DEFAULT_WEATHER_LOOKBACK_YEARS
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|date| {
            REQUEST_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(&date, format).ok())
                .ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "optional_date_of_simulation '{date}' is not a date like 10-March-2023"
                    ))
                })
        })
        .transpose()
}

#[derive(Clone, Copy, Debug, Deserialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct SolarInput {
    /// in m
    #[validate(exclusive_minimum = 0.)]
    pub length: f64,
    /// in m
    #[validate(exclusive_minimum = 0.)]
    pub width: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub solar_efficiency: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct WaterPumpInput {
    /// in litres/minute
    #[validate(exclusive_minimum = 0.)]
    pub max_flow_rate: f64,
    #[serde(rename = "maximum_temp_difference_between_water_incoming_and_outgoing_solar")]
    pub max_temp_difference: f64,
    #[serde(rename = "minimum_temp_difference_between_water_incoming_and_outgoing_solar")]
    pub min_temp_difference: f64,
    /// in litres/minute
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub min_flow_rate: f64,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct WaterContainerInput {
    /// in litres
    #[validate(exclusive_minimum = 0.)]
    pub water_capacity: f64,
    #[serde(rename = "percent_of_thermal_energy_absorbed_from_pipes")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub absorption_fraction: f64,
    #[serde(rename = "percent_of_thermal_energy_lost_to_waste_per_hour")]
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub loss_fraction_per_hour: f64,
    pub temperature_of_external_water_source: f64,
    #[validate(exclusive_minimum = 0.)]
    #[validate(maximum = 1.)]
    pub efficiency_of_traditional_boiler: f64,
    pub minimum_average_water_temperature: f64,
    /// Keys are the hours of the day, e.g. "01:00" for 1am
    pub consumption_pattern: ConsumptionPatternInput,
}

pub type ConsumptionPatternInput = IndexMap<String, ConsumptionPatternOneHour>;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ConsumptionPatternOneHour {
    /// in litres
    pub water_used: f64,
    /// in deg C
    pub average_temperature_of_water_used: f64,
}
