use crate::errors::UpstreamDataError;
use crate::external_conditions::{weather_window, WeatherSample, WeatherSeries};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder as CsvReaderBuilder;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::debug;

// Open-Meteo gives local times like "2023-03-10T07:00"
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Source of the historical hourly irradiance for a location.
pub trait WeatherProvider: Debug {
    /// Fetch the hourly series covering `lookback_years` before `start_date` (ending a week before
    /// it), ordered by timestamp.
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        lookback_years: u32,
    ) -> Result<WeatherSeries, UpstreamDataError>;
}

/// An already loaded series is handed over as it is, wherever and whenever it is asked for.
impl WeatherProvider for WeatherSeries {
    fn fetch(
        &self,
        _latitude: f64,
        _longitude: f64,
        _start_date: NaiveDate,
        _lookback_years: u32,
    ) -> Result<WeatherSeries, UpstreamDataError> {
        Ok(self.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum WeatherFileFormat {
    /// An Open-Meteo historical weather API response
    OpenMeteo,
    /// A CSV file with `time` and `direct_normal_irradiance` columns
    Csv,
}

/// Weather read from a file holding the history for the location being simulated, clipped to the
/// window a simulation needs.
#[derive(Clone, Debug)]
pub struct FileWeatherProvider {
    path: PathBuf,
    format: WeatherFileFormat,
}

impl FileWeatherProvider {
    pub fn new(path: PathBuf, format: WeatherFileFormat) -> Self {
        Self { path, format }
    }
}

impl WeatherProvider for FileWeatherProvider {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        lookback_years: u32,
    ) -> Result<WeatherSeries, UpstreamDataError> {
        let file = File::open(&self.path).map_err(|err| {
            UpstreamDataError::WeatherUnavailable(format!(
                "could not open weather file {}: {err}",
                self.path.display()
            ))
        })?;
        let reader = BufReader::new(file);

        let weather_series = match self.format {
            WeatherFileFormat::OpenMeteo => weather_series_from_open_meteo_json(reader)?,
            WeatherFileFormat::Csv => weather_series_from_csv(reader)?,
        };

        let (first_date, last_date) = weather_window(start_date, lookback_years)?;
        debug!(
            "Using weather from {} for ({latitude}, {longitude}) between {first_date} and {last_date}",
            self.path.display()
        );

        Ok(weather_series.within_dates(first_date, last_date))
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    direct_normal_irradiance: Vec<Option<f64>>,
}

/// Read an Open-Meteo historical weather response. Hours the archive has no irradiance for are
/// given as null and kept in the series without a reading.
pub fn weather_series_from_open_meteo_json(
    json: impl Read,
) -> Result<WeatherSeries, UpstreamDataError> {
    let response: OpenMeteoResponse = serde_json::from_reader(json)
        .map_err(|err| UpstreamDataError::MalformedWeatherData(err.to_string()))?;
    let OpenMeteoHourly {
        time,
        direct_normal_irradiance,
    } = response.hourly;

    if time.len() != direct_normal_irradiance.len() {
        return Err(UpstreamDataError::MalformedWeatherData(format!(
            "{} timestamps given for {} irradiance values",
            time.len(),
            direct_normal_irradiance.len()
        )));
    }

    let samples = time
        .iter()
        .zip(direct_normal_irradiance)
        .map(|(time, irradiance)| {
            Ok(WeatherSample {
                timestamp: parse_timestamp(time)?,
                direct_normal_irradiance: irradiance,
            })
        })
        .collect::<Result<Vec<_>, UpstreamDataError>>()?;

    WeatherSeries::new(samples)
}

#[derive(Debug, Deserialize)]
struct CsvWeatherRecord {
    time: String,
    direct_normal_irradiance: Option<f64>,
}

/// Read a CSV file with a heading row of `time,direct_normal_irradiance`. An empty irradiance
/// marks an hour without a reading.
pub fn weather_series_from_csv(file: impl Read) -> Result<WeatherSeries, UpstreamDataError> {
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut samples = vec![];
    for result in reader.deserialize() {
        let record: CsvWeatherRecord =
            result.map_err(|err| UpstreamDataError::MalformedWeatherData(err.to_string()))?;
        samples.push(WeatherSample {
            timestamp: parse_timestamp(&record.time)?,
            direct_normal_irradiance: record.direct_normal_irradiance,
        });
    }

    WeatherSeries::new(samples)
}

fn parse_timestamp(time: &str) -> Result<NaiveDateTime, UpstreamDataError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(time, format).ok())
        .ok_or_else(|| {
            UpstreamDataError::MalformedWeatherData(format!("'{time}' is not a timestamp"))
        })
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves a postal address to a location.
pub trait Geocoder: Debug {
    fn resolve(&self, address: &str) -> Result<Location, UpstreamDataError>;
}

/// A geocoder backed by a fixed table of addresses, loaded from a JSON object of
/// `{"<address>": {"latitude": .., "longitude": ..}}`. Addresses match ignoring case and
/// surrounding whitespace.
#[derive(Clone, Debug, Default)]
pub struct TableGeocoder {
    locations: IndexMap<String, Location>,
}

impl TableGeocoder {
    pub fn new(locations: IndexMap<String, Location>) -> Self {
        Self {
            locations: locations
                .into_iter()
                .map(|(address, location)| (normalise_address(&address), location))
                .collect(),
        }
    }

    pub fn from_json(json: impl Read) -> Result<Self, UpstreamDataError> {
        let locations: IndexMap<String, Location> = serde_json::from_reader(json).map_err(|err| {
            UpstreamDataError::AddressNotFound(format!("geocoding table could not be read: {err}"))
        })?;

        Ok(Self::new(locations))
    }
}

impl Geocoder for TableGeocoder {
    fn resolve(&self, address: &str) -> Result<Location, UpstreamDataError> {
        self.locations
            .get(&normalise_address(address))
            .copied()
            .ok_or_else(|| UpstreamDataError::AddressNotFound(address.to_string()))
    }
}

fn normalise_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Resolves every address to the same location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedLocation(pub Location);

impl Geocoder for FixedLocation {
    fn resolve(&self, _address: &str) -> Result<Location, UpstreamDataError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_conditions::CalendarKey;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn open_meteo_json() -> &'static str {
        r#"{
            "latitude": 40.7,
            "longitude": -74.0,
            "timezone": "America/New_York",
            "hourly_units": {"time": "iso8601", "direct_normal_irradiance": "W/m²"},
            "hourly": {
                "time": ["2021-03-10T11:00", "2021-03-10T12:00", "2021-03-10T13:00", "2022-03-10T12:00"],
                "direct_normal_irradiance": [420.5, 800.0, null, 600.0]
            }
        }"#
    }

    #[rstest]
    pub fn should_read_open_meteo_response(open_meteo_json: &str) {
        let weather_series = weather_series_from_open_meteo_json(open_meteo_json.as_bytes()).unwrap();

        assert_eq!(weather_series.len(), 4);
        assert_eq!(weather_series.get(2).unwrap().direct_normal_irradiance, None);
        assert_eq!(
            weather_series.get(0).unwrap().timestamp,
            NaiveDate::from_ymd_opt(2021, 3, 10)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap()
        );
        assert_eq!(
            weather_series.historical_mean(CalendarKey::new(3, 10, 12)),
            Some(700.)
        );
        assert_eq!(weather_series.historical_mean(CalendarKey::new(3, 10, 13)), None);
    }

    #[rstest]
    pub fn should_reject_mismatched_open_meteo_arrays() {
        let json = r#"{"hourly": {"time": ["2021-03-10T11:00"], "direct_normal_irradiance": []}}"#;

        assert!(matches!(
            weather_series_from_open_meteo_json(json.as_bytes()),
            Err(UpstreamDataError::MalformedWeatherData(_))
        ));
    }

    #[rstest]
    pub fn should_read_csv_weather() {
        let csv = "time,direct_normal_irradiance\n\
                   2021-03-10T11:00,420.5\n\
                   2021-03-10 12:00, 800\n\
                   2021-03-10T13:00,\n";

        let weather_series = weather_series_from_csv(csv.as_bytes()).unwrap();

        assert_eq!(weather_series.len(), 3);
        assert_eq!(
            weather_series.get(1).unwrap().direct_normal_irradiance,
            Some(800.)
        );
        assert_eq!(weather_series.get(2).unwrap().direct_normal_irradiance, None);
    }

    #[rstest]
    pub fn should_reject_csv_with_bad_timestamp() {
        let csv = "time,direct_normal_irradiance\nyesterday,420.5\n";

        assert!(matches!(
            weather_series_from_csv(csv.as_bytes()),
            Err(UpstreamDataError::MalformedWeatherData(_))
        ));
    }

    #[rstest]
    pub fn should_resolve_addresses_in_table() {
        let geocoder = TableGeocoder::from_json(
            r#"{"1 Sunny Street, Springfield": {"latitude": 39.8, "longitude": -89.6}}"#.as_bytes(),
        )
        .unwrap();

        assert_eq!(
            geocoder.resolve("  1 sunny street, springfield ").unwrap(),
            Location {
                latitude: 39.8,
                longitude: -89.6
            }
        );
        assert!(matches!(
            geocoder.resolve("2 Cloudy Lane"),
            Err(UpstreamDataError::AddressNotFound(address)) if address == "2 Cloudy Lane"
        ));
    }

    #[rstest]
    pub fn should_report_missing_weather_file() {
        let provider = FileWeatherProvider::new(
            PathBuf::from("/definitely/not/a/weather/file.json"),
            WeatherFileFormat::OpenMeteo,
        );

        assert!(matches!(
            provider.fetch(0., 0., NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(), 20),
            Err(UpstreamDataError::WeatherUnavailable(_))
        ));
    }
}
