use anyhow::anyhow;
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    /// `file_template` has a `{}` placeholder for the location key, e.g. "{}_hourly_results.csv"
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|err| anyhow!("could not name output file from template: {err}"))?;
        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

const HEADINGS: [&str; 16] = [
    "simulation_uuid",
    "timestamp",
    "direct_normal_irradiance",
    "water_temp_into_solar",
    "water_temp_out_of_solar",
    "energy_captured_by_solar",
    "solar_efficiency",
    "water_flow_rate",
    "percent_of_max_flow_rate_used",
    "average_water_temperature",
    "thermal_energy_in_container",
    "average_temperature_of_water_sent_out",
    "energy_sent_out",
    "volume_of_water_sent_out",
    "energy_consumed_by_heater",
    "energy_absorbed_from_pipes",
];

const UNITS_ROW: [&str; 16] = [
    "", "", "[W/m2]", "[deg C]", "[deg C]", "[J]", "[ratio]", "[l/min]", "[ratio]", "[deg C]",
    "[J]", "[deg C]", "[J]", "[litres]", "[J]", "[J]",
];

/// The state of the installation logged at the start of one simulated hour
#[derive(Clone, Debug, PartialEq)]
pub struct HourlyResultRow {
    pub simulation_uuid: String,
    pub timestamp: NaiveDateTime,
    pub direct_normal_irradiance: f64,
    pub water_temp_into_solar: f64,
    pub water_temp_out_of_solar: f64,
    pub energy_captured_by_solar: f64,
    pub solar_efficiency: f64,
    pub water_flow_rate: f64,
    pub percent_of_max_flow_rate_used: f64,
    pub average_water_temperature: f64,
    pub thermal_energy_in_container: f64,
    pub average_temperature_of_water_sent_out: f64,
    pub energy_sent_out: f64,
    pub volume_of_water_sent_out: f64,
    pub energy_consumed_by_heater: f64,
    pub energy_absorbed_from_pipes: f64,
}

impl HourlyResultRow {
    pub fn headings() -> &'static [&'static str] {
        &HEADINGS
    }

    fn to_record(&self) -> [String; 16] {
        [
            self.simulation_uuid.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.direct_normal_irradiance.to_string(),
            self.water_temp_into_solar.to_string(),
            self.water_temp_out_of_solar.to_string(),
            self.energy_captured_by_solar.to_string(),
            self.solar_efficiency.to_string(),
            self.water_flow_rate.to_string(),
            self.percent_of_max_flow_rate_used.to_string(),
            self.average_water_temperature.to_string(),
            self.thermal_energy_in_container.to_string(),
            self.average_temperature_of_water_sent_out.to_string(),
            self.energy_sent_out.to_string(),
            self.volume_of_water_sent_out.to_string(),
            self.energy_consumed_by_heater.to_string(),
            self.energy_absorbed_from_pipes.to_string(),
        ]
    }
}

/// Receives one row per simulated hour.
pub trait ResultSink {
    fn append(&mut self, row: &HourlyResultRow) -> anyhow::Result<()>;

    /// Flush anything held back once a run is over.
    fn finalize(&mut self) -> anyhow::Result<()>;
}

impl<T: ResultSink + ?Sized> ResultSink for &mut T {
    fn append(&mut self, row: &HourlyResultRow) -> anyhow::Result<()> {
        (**self).append(row)
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        (**self).finalize()
    }
}

/// Writes rows out as CSV, preceded by a headings row and a units row.
pub struct CsvResultSink<W: Write> {
    writer: csv::Writer<W>,
    headings_written: bool,
}

impl<W: Write> CsvResultSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: WriterBuilder::new().from_writer(writer),
            headings_written: false,
        }
    }

    fn write_headings(&mut self) -> anyhow::Result<()> {
        if !self.headings_written {
            self.writer.write_record(HEADINGS)?;
            self.writer.write_record(UNITS_ROW)?;
            self.headings_written = true;
        }
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow!("could not finish writing results: {}", err.error()))
    }
}

impl<W: Write> ResultSink for CsvResultSink<W> {
    fn append(&mut self, row: &HourlyResultRow) -> anyhow::Result<()> {
        self.write_headings()?;
        self.writer.write_record(row.to_record())?;
        Ok(())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        // an empty run still gets its headings
        self.write_headings()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory.
#[derive(Debug, Default)]
pub struct VecResultSink {
    rows: Vec<HourlyResultRow>,
    finalized: bool,
}

impl VecResultSink {
    pub fn rows(&self) -> &[HourlyResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<HourlyResultRow> {
        self.rows
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl ResultSink for VecResultSink {
    fn append(&mut self, row: &HourlyResultRow) -> anyhow::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        self.finalized = true;
        Ok(())
    }
}
