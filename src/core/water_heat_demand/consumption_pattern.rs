use crate::core::common::ComponentId;
use crate::core::units::HOURS_PER_DAY;
use crate::errors::ConfigurationError;
use crate::input::ConsumptionPatternInput;
use chrono::NaiveTime;
use indexmap::IndexMap;
use itertools::Itertools;

const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Hot water drawn off from the tank during one hour of the day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawOff {
    pub volume: f64,      // litres
    pub temperature: f64, // deg C, average temperature of the water used
}

impl DrawOff {
    /// Whether this draw-off takes any heat out of the tank, given the temperature of the
    /// unheated water that replaces it.
    pub fn removes_heat(&self, cold_feed_temp: f64) -> bool {
        self.volume > 0. && self.temperature > cold_feed_temp
    }
}

/// The daily pattern of hot water use, keyed by time of day.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionPattern {
    draw_offs: IndexMap<NaiveTime, DrawOff>,
}

impl ConsumptionPattern {
    pub fn new(draw_offs: IndexMap<NaiveTime, DrawOff>) -> Self {
        Self { draw_offs }
    }

    /// A pattern with no water drawn off in any hour.
    pub fn zero_draw() -> Self {
        Self::new(
            (0..HOURS_PER_DAY)
                .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
                .map(|time_of_day| {
                    (
                        time_of_day,
                        DrawOff {
                            volume: 0.,
                            temperature: 0.,
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn from_input(input: &ConsumptionPatternInput) -> Result<Self, ConfigurationError> {
        let draw_offs = input
            .iter()
            .map(|(time_of_day, hour)| {
                let time_of_day = parse_time_of_day(time_of_day)?;
                Ok((
                    time_of_day,
                    DrawOff {
                        volume: hour.water_used,
                        temperature: hour.average_temperature_of_water_used,
                    },
                ))
            })
            .collect::<Result<IndexMap<_, _>, ConfigurationError>>()?;

        Ok(Self::new(draw_offs))
    }

    pub fn draw_off_at(&self, time_of_day: NaiveTime) -> Option<&DrawOff> {
        self.draw_offs.get(&time_of_day)
    }

    /// Whole hours of the day ("HH:00") for which the pattern has no entry.
    pub fn missing_hours(&self) -> Vec<NaiveTime> {
        (0..HOURS_PER_DAY)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .filter(|time_of_day| !self.draw_offs.contains_key(time_of_day))
            .collect()
    }

    /// Total volume drawn off over a day, in litres
    pub fn daily_volume(&self) -> f64 {
        self.draw_offs.values().map(|draw_off| draw_off.volume).sum()
    }
}

pub fn parse_time_of_day(time_of_day: &str) -> Result<NaiveTime, ConfigurationError> {
    NaiveTime::parse_from_str(time_of_day, TIME_OF_DAY_FORMAT)
        .map_err(|_| {
            ConfigurationError::new(
                ComponentId::StorageTank,
                format!(
                    "consumption pattern key '{time_of_day}' is not a time of day in HH:MM format"
                ),
            )
        })
}

pub fn format_time_of_day(time_of_day: NaiveTime) -> String {
    time_of_day.format(TIME_OF_DAY_FORMAT).to_string()
}

pub(crate) fn format_times_of_day(times_of_day: &[NaiveTime]) -> String {
    times_of_day
        .iter()
        .map(|time_of_day| format_time_of_day(*time_of_day))
        .join(", ")
}
