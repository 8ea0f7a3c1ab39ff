use crate::errors::UpstreamDataError;
use crate::statistics::mean;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{Display, Formatter};

// how far back from the start date the most recent weather is taken, to be sure it has been published
const WEATHER_PUBLICATION_LAG_DAYS: u64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    /// in W/m2, None where the archive has no reading for the hour
    pub direct_normal_irradiance: Option<f64>,
}

impl WeatherSample {
    pub fn new(timestamp: NaiveDateTime, direct_normal_irradiance: f64) -> Self {
        Self {
            timestamp,
            direct_normal_irradiance: Some(direct_normal_irradiance),
        }
    }

    pub fn missing(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            direct_normal_irradiance: None,
        }
    }
}

/// The same hour on the same calendar day, in any year
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CalendarKey {
    month: u32,
    day: u32,
    hour: u32,
}

impl CalendarKey {
    pub fn new(month: u32, day: u32, hour: u32) -> Self {
        Self { month, day, hour }
    }

    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self::new(timestamp.month(), timestamp.day(), timestamp.hour())
    }
}

impl Display for CalendarKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02} {:02}:00", self.month, self.day, self.hour)
    }
}

/// An hourly historical irradiance series, ordered by timestamp and immutable once built.
///
/// Hours without a reading still count as hours of the series but play no part in averaging.
#[derive(Clone, Debug)]
pub struct WeatherSeries {
    samples: Vec<WeatherSample>,
    sample_indices_by_calendar_key: IndexMap<CalendarKey, Vec<usize>>,
}

impl WeatherSeries {
    pub fn new(mut samples: Vec<WeatherSample>) -> Result<Self, UpstreamDataError> {
        if let Some(sample) = samples
            .iter()
            .find(|sample| {
                sample
                    .direct_normal_irradiance
                    .is_some_and(|irradiance| !irradiance.is_finite())
            })
        {
            return Err(UpstreamDataError::MalformedWeatherData(format!(
                "irradiance at {} is not a number",
                sample.timestamp
            )));
        }

        samples.sort_by_key(|sample| sample.timestamp);

        if let Some(duplicate) = samples
            .windows(2)
            .find(|pair| pair[0].timestamp == pair[1].timestamp)
        {
            return Err(UpstreamDataError::MalformedWeatherData(format!(
                "more than one sample for {}",
                duplicate[0].timestamp
            )));
        }

        Ok(Self::from_sorted(samples))
    }

    fn from_sorted(samples: Vec<WeatherSample>) -> Self {
        let mut sample_indices_by_calendar_key: IndexMap<CalendarKey, Vec<usize>> =
            IndexMap::new();
        for (idx, sample) in samples.iter().enumerate() {
            if sample.direct_normal_irradiance.is_none() {
                continue;
            }
            sample_indices_by_calendar_key
                .entry(CalendarKey::of(&sample.timestamp))
                .or_default()
                .push(idx);
        }

        Self {
            samples,
            sample_indices_by_calendar_key,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&WeatherSample> {
        self.samples.get(idx)
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    /// Mean irradiance over every year in the series for the given calendar hour, or None if the
    /// series has no readings for it.
    pub fn historical_mean(&self, calendar_key: CalendarKey) -> Option<f64> {
        let irradiances = self
            .sample_indices_by_calendar_key
            .get(&calendar_key)?
            .iter()
            .filter_map(|&idx| self.samples[idx].direct_normal_irradiance)
            .collect::<Vec<_>>();

        mean(&irradiances)
    }

    /// The samples falling between the two dates, both inclusive.
    pub fn within_dates(&self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let samples = self
            .samples
            .iter()
            .filter(|sample| (start_date..=end_date).contains(&sample.timestamp.date()))
            .copied()
            .collect::<Vec<_>>();

        Self::from_sorted(samples)
    }
}

/// Move a timestamp forward by whole years. A 29th of February lands on the 28th in a year without one.
pub fn shift_years(timestamp: NaiveDateTime, years: u32) -> Option<NaiveDateTime> {
    timestamp.checked_add_months(Months::new(years.checked_mul(12)?))
}

/// First and last dates (inclusive) of the historical weather needed for a simulation starting on
/// `start_date`, averaging over `lookback_years`.
pub fn weather_window(
    start_date: NaiveDate,
    lookback_years: u32,
) -> Result<(NaiveDate, NaiveDate), UpstreamDataError> {
    let out_of_range = || {
        UpstreamDataError::WeatherUnavailable(format!(
            "cannot look back {lookback_years} years from {start_date}"
        ))
    };

    let end_date = start_date
        .checked_sub_days(Days::new(WEATHER_PUBLICATION_LAG_DAYS))
        .ok_or_else(out_of_range)?;
    let start_date = end_date
        .checked_sub_months(Months::new(
            lookback_years.checked_mul(12).ok_or_else(out_of_range)?,
        ))
        .ok_or_else(out_of_range)?;

    Ok((start_date, end_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[fixture]
    pub fn weather_series() -> WeatherSeries {
        WeatherSeries::new(vec![
            WeatherSample::new(at(2022, 3, 10, 12), 600.),
            WeatherSample::new(at(2020, 3, 10, 12), 800.),
            WeatherSample::new(at(2021, 3, 10, 12), 700.),
            WeatherSample::new(at(2021, 3, 10, 13), 500.),
            WeatherSample::new(at(2021, 3, 11, 12), 100.),
        ])
        .unwrap()
    }

    #[rstest]
    pub fn should_order_samples_by_timestamp(weather_series: WeatherSeries) {
        let timestamps = weather_series
            .samples()
            .iter()
            .map(|sample| sample.timestamp)
            .collect::<Vec<_>>();

        assert_eq!(
            timestamps,
            vec![
                at(2020, 3, 10, 12),
                at(2021, 3, 10, 12),
                at(2021, 3, 10, 13),
                at(2021, 3, 11, 12),
                at(2022, 3, 10, 12),
            ]
        );
    }

    #[rstest]
    pub fn should_average_same_calendar_hour_across_years(weather_series: WeatherSeries) {
        assert_relative_eq!(
            weather_series
                .historical_mean(CalendarKey::new(3, 10, 12))
                .unwrap(),
            700.
        );
        assert_eq!(
            weather_series.historical_mean(CalendarKey::new(3, 10, 13)),
            Some(500.)
        );
    }

    #[rstest]
    pub fn should_have_no_mean_for_calendar_hour_not_in_series(weather_series: WeatherSeries) {
        assert_eq!(weather_series.historical_mean(CalendarKey::new(7, 1, 12)), None);
    }

    #[rstest]
    pub fn should_keep_hours_without_reading_out_of_mean() {
        let weather_series = WeatherSeries::new(vec![
            WeatherSample::new(at(2020, 3, 10, 12), 800.),
            WeatherSample::missing(at(2021, 3, 10, 12)),
            WeatherSample::missing(at(2021, 3, 10, 13)),
            WeatherSample::new(at(2022, 3, 10, 12), 600.),
        ])
        .unwrap();

        assert_eq!(weather_series.len(), 4);
        assert_eq!(
            weather_series.historical_mean(CalendarKey::new(3, 10, 12)),
            Some(700.)
        );
        assert_eq!(weather_series.historical_mean(CalendarKey::new(3, 10, 13)), None);
    }

    #[rstest]
    pub fn should_reject_duplicate_timestamps() {
        let result = WeatherSeries::new(vec![
            WeatherSample::new(at(2020, 3, 10, 12), 800.),
            WeatherSample::new(at(2020, 3, 10, 12), 810.),
        ]);

        assert!(matches!(
            result,
            Err(UpstreamDataError::MalformedWeatherData(_))
        ));
    }

    #[rstest]
    pub fn should_reject_irradiance_that_is_not_a_number() {
        let result = WeatherSeries::new(vec![WeatherSample::new(at(2020, 3, 10, 12), f64::NAN)]);

        assert!(matches!(
            result,
            Err(UpstreamDataError::MalformedWeatherData(_))
        ));
    }

    #[rstest]
    pub fn should_keep_only_samples_within_dates(weather_series: WeatherSeries) {
        let within = weather_series.within_dates(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 10).unwrap(),
        );

        assert_eq!(within.len(), 2);
        assert_eq!(
            within.historical_mean(CalendarKey::new(3, 10, 12)),
            Some(700.)
        );
    }

    #[rstest]
    #[case(at(2003, 6, 1, 9), 20, at(2023, 6, 1, 9))]
    #[case(at(2004, 2, 29, 15), 20, at(2024, 2, 29, 15))]
    #[case(at(2004, 2, 29, 15), 1, at(2005, 2, 28, 15))]
    #[case(at(2010, 12, 31, 23), 0, at(2010, 12, 31, 23))]
    pub fn should_shift_timestamps_by_whole_years(
        #[case] timestamp: NaiveDateTime,
        #[case] years: u32,
        #[case] expected: NaiveDateTime,
    ) {
        assert_eq!(shift_years(timestamp, years), Some(expected));
    }

    #[rstest]
    pub fn should_end_weather_window_a_week_before_start() {
        let (first, last) =
            weather_window(NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(), 20).unwrap();

        assert_eq!(first, NaiveDate::from_ymd_opt(2003, 3, 3).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 3, 3).unwrap());
    }

    #[rstest]
    pub fn should_display_calendar_key() {
        assert_eq!(CalendarKey::new(3, 9, 7).to_string(), "03-09 07:00");
    }
}
