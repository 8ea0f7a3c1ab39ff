extern crate solar_thermal_sim;

use anyhow::bail;
use clap::{Args, Parser};
use solar_thermal_sim::output::FileOutput;
use solar_thermal_sim::read_weather_file::{
    FileWeatherProvider, FixedLocation, Location, TableGeocoder, WeatherFileFormat,
};
use solar_thermal_sim::{run_simulation, StopHandle, RESULTS_FILE_TEMPLATE};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct SimulationArgs {
    /// JSON simulation request
    request_file: PathBuf,
    /// Historical hourly weather for the location being simulated
    #[arg(long, short)]
    weather: PathBuf,
    #[arg(long, value_enum, default_value_t = WeatherFileFormat::OpenMeteo)]
    weather_format: WeatherFileFormat,
    #[command(flatten)]
    location: LocationChoice,
    /// Directory the hourly results are written to
    #[arg(long, short, default_value = ".")]
    output_dir: PathBuf,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = true)]
struct LocationChoice {
    /// JSON table of addresses to latitude and longitude
    #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
    geocode_table: Option<PathBuf>,
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    latitude: Option<f64>,
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    longitude: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    let args = SimulationArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let input = BufReader::new(File::open(&args.request_file)?);
    let output = FileOutput::new(args.output_dir.clone(), RESULTS_FILE_TEMPLATE.to_string());
    let weather_provider = FileWeatherProvider::new(args.weather, args.weather_format);
    let stop = StopHandle::new();

    let result = match args.location {
        LocationChoice {
            geocode_table: Some(table),
            ..
        } => {
            let geocoder = TableGeocoder::from_json(BufReader::new(File::open(table)?))?;
            run_simulation(input, output, &geocoder, &weather_provider, &stop)
        }
        LocationChoice {
            geocode_table: None,
            latitude: Some(latitude),
            longitude: Some(longitude),
        } => {
            let geocoder = FixedLocation(Location {
                latitude,
                longitude,
            });
            run_simulation(input, output, &geocoder, &weather_provider, &stop)
        }
        _ => bail!("either a geocode table or a latitude and longitude must be given"),
    };

    match result {
        Ok(summary) => {
            info!("Results written to {}", args.output_dir.display());
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(err) => {
            error!("{err}");
            Err(err.into())
        }
    }
}
