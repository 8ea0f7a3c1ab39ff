use crate::core::units::HOURS_PER_DAY;
use crate::errors::UpstreamDataError;
use crate::external_conditions::{shift_years, CalendarKey, WeatherSeries};
use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// The hourly clock of a simulation run.
///
/// Each tick follows one sample of the historical weather series in order, moved forward so that
/// the run lands on contemporary dates. Every sample moves by the same offset, the one that carries
/// the first sample forward by a whole number of years, so simulated timestamps stay strictly
/// increasing across a 29th of February. Averaging still happens by the calendar hour of the
/// historical sample.
#[derive(Clone, Debug)]
pub struct SimulationTime {
    ticks: Vec<(NaiveDateTime, NaiveDateTime)>, // (historical, simulated)
}

impl SimulationTime {
    pub fn from_weather_series(
        weather_series: &WeatherSeries,
        num_hours: usize,
        year_offset: u32,
    ) -> Result<Self, UpstreamDataError> {
        if weather_series.len() < num_hours {
            return Err(UpstreamDataError::InsufficientWeatherData {
                required: num_hours,
                available: weather_series.len(),
            });
        }

        let samples = &weather_series.samples()[..num_hours];
        let Some(first) = samples.first() else {
            return Ok(Self { ticks: vec![] });
        };
        let out_of_range = |timestamp: NaiveDateTime| {
            UpstreamDataError::MalformedWeatherData(format!(
                "cannot move {timestamp} forward by {year_offset} years"
            ))
        };
        let offset = shift_years(first.timestamp, year_offset)
            .ok_or_else(|| out_of_range(first.timestamp))?
            - first.timestamp;

        let ticks = samples
            .iter()
            .map(|sample| {
                sample
                    .timestamp
                    .checked_add_signed(offset)
                    .map(|simulated| (sample.timestamp, simulated))
                    .ok_or_else(|| out_of_range(sample.timestamp))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ticks })
    }

    pub fn total_steps(&self) -> usize {
        self.ticks.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = SimulationTimeIteration> + '_ {
        self.ticks
            .iter()
            .enumerate()
            .map(|(index, &(historical_timestamp, timestamp))| SimulationTimeIteration {
                index,
                timestamp,
                historical_timestamp,
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub historical_timestamp: NaiveDateTime,
}

impl SimulationTimeIteration {
    pub fn hour_of_day(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Start of the hour, used as the key into the daily consumption pattern
    pub fn time_of_day(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.timestamp.hour(), self.timestamp.minute(), 0)
            .unwrap_or_default()
    }

    pub fn calendar_key(&self) -> CalendarKey {
        CalendarKey::of(&self.historical_timestamp)
    }

    /// Whether this iteration completes a whole number of simulated days
    pub fn completes_day(&self) -> bool {
        (self.index + 1) % HOURS_PER_DAY as usize == 0
    }
}
