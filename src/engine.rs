use crate::core::common::ComponentId;
use crate::core::heating_systems::circulation_pump::CirculationPump;
use crate::core::heating_systems::solar_collector::SolarCollector;
use crate::core::heating_systems::storage_tank::{StorageTank, StorageTankError};
use crate::core::units::{joules_to_kilowatt_hours, SECONDS_PER_MINUTE};
use crate::core::water_heat_demand::consumption_pattern::{
    format_time_of_day, ConsumptionPattern,
};
use crate::errors::{ConfigurationError, SimulationError};
use crate::external_conditions::WeatherSeries;
use crate::input::SimulationRequest;
use crate::output::{HourlyResultRow, ResultSink};
use crate::simulation_time::{SimulationTime, SimulationTimeIteration};
use crate::statistics;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation for a running simulation, checked between simulated hours.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled { hours_completed: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub simulation_uuid: String,
    pub outcome: RunOutcome,
    pub hours_simulated: usize,
    pub hours_heater_fired: usize,
    /// in J, negative as the heater covers an energy deficit
    pub total_energy_consumed_by_heater: f64,
    /// in J
    pub total_energy_captured_by_solar: f64,
    pub min_tank_temperature: Option<f64>,
    pub max_tank_temperature: Option<f64>,
    pub mean_tank_temperature: Option<f64>,
    pub final_tank_temperature: f64,
    /// wall clock time taken, not part of the simulated state
    pub elapsed_seconds: f64,
}

/// Runs the hourly loop coupling the collector, pump and tank of one installation.
///
/// The row logged for each hour describes the state going into that hour, i.e. the result of the
/// previous hour's physics. The direct normal irradiance in that row is the value used for the
/// previous hour as well, starting from 0.
#[derive(Debug)]
pub struct SimulationEngine {
    simulation_uuid: String,
    solar_collector: SolarCollector,
    circulation_pump: CirculationPump,
    storage_tank: StorageTank,
    weather_series: WeatherSeries,
    simulation_time: SimulationTime,
    current_direct_normal_irradiance: f64,
}

impl SimulationEngine {
    pub fn new(
        request: &SimulationRequest,
        weather_series: WeatherSeries,
    ) -> Result<Self, SimulationError> {
        let consumption_pattern =
            ConsumptionPattern::from_input(&request.water_container.consumption_pattern)?;
        debug!(
            "Consumption pattern draws off {} litres a day",
            consumption_pattern.daily_volume()
        );
        let simulation_time = SimulationTime::from_weather_series(
            &weather_series,
            request.num_hours_to_simulate,
            request.weather_lookback_years,
        )?;

        Ok(Self {
            simulation_uuid: request.uuid.clone(),
            solar_collector: SolarCollector::from_input(&request.solar),
            circulation_pump: CirculationPump::from_input(&request.water_pump),
            storage_tank: StorageTank::from_input(&request.water_container, consumption_pattern),
            weather_series,
            simulation_time,
            current_direct_normal_irradiance: 0.,
        })
    }

    pub fn run(
        &mut self,
        sink: &mut impl ResultSink,
        stop: &StopHandle,
    ) -> Result<RunSummary, SimulationError> {
        let start_time = Instant::now();
        let num_iterations = self.simulation_time.total_steps();
        info!(
            "Starting simulation {} for {num_iterations} hours",
            self.simulation_uuid
        );

        let mut outcome = RunOutcome::Completed;
        let mut hours_heater_fired = 0;
        let mut total_energy_consumed_by_heater = 0.;
        let mut total_energy_captured_by_solar = 0.;
        let mut tank_temperatures = Vec::with_capacity(num_iterations);

        let simulation_time = self.simulation_time.clone();
        for t_it in simulation_time.iter() {
            if stop.is_stop_requested() {
                info!("Simulation stopped after {} hours", t_it.index);
                outcome = RunOutcome::Cancelled {
                    hours_completed: t_it.index,
                };
                break;
            }

            sink.append(&self.result_row(&t_it))
                .map_err(SimulationError::ResultSink)?;

            self.run_hour(&t_it)?;

            let tank_metrics = self.storage_tank.metrics();
            if tank_metrics.heater_fired {
                hours_heater_fired += 1;
            }
            total_energy_consumed_by_heater += tank_metrics.energy_consumed_by_heater;
            total_energy_captured_by_solar += self.solar_collector.metrics().energy_captured;
            tank_temperatures.push(tank_metrics.average_water_temp);

            if t_it.completes_day() {
                let elapsed = start_time.elapsed().as_secs_f64();
                info!(
                    "Simulation running for: {elapsed:.3} seconds on iteration {}/{num_iterations}, avg speed per iteration: {:.7}",
                    t_it.index + 1,
                    elapsed / (t_it.index + 1) as f64
                );
            }
        }

        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        info!(
            "Simulation took: {:.2} mins, auxiliary heater fired in {hours_heater_fired} hours using {:.3} kWh",
            elapsed_seconds / SECONDS_PER_MINUTE as f64,
            -joules_to_kilowatt_hours(total_energy_consumed_by_heater)
        );

        Ok(RunSummary {
            simulation_uuid: self.simulation_uuid.clone(),
            outcome,
            hours_simulated: tank_temperatures.len(),
            hours_heater_fired,
            total_energy_consumed_by_heater,
            total_energy_captured_by_solar,
            min_tank_temperature: statistics::min(&tank_temperatures),
            max_tank_temperature: statistics::max(&tank_temperatures),
            mean_tank_temperature: statistics::mean(&tank_temperatures),
            final_tank_temperature: self.storage_tank.current_average_temp(),
            elapsed_seconds,
        })
    }

    fn run_hour(&mut self, t_it: &SimulationTimeIteration) -> Result<(), SimulationError> {
        let calendar_key = t_it.calendar_key();
        self.current_direct_normal_irradiance = self
            .weather_series
            .historical_mean(calendar_key)
            .unwrap_or_else(|| {
                warn!("No historical irradiance for {calendar_key}, using 0");
                0.
            });

        // the pump sets this hour's flow from what it saw last hour
        let flow_rate = self.circulation_pump.current_flow_rate();
        let water_temp_into_solar = self.storage_tank.outgoing_water_temp();
        let water_temp_out_of_solar = self.solar_collector.capture_hour(
            self.current_direct_normal_irradiance,
            flow_rate,
            water_temp_into_solar,
        );

        self.storage_tank
            .run_hour(water_temp_out_of_solar, flow_rate, t_it.time_of_day())
            .map_err(|err| match err {
                StorageTankError::PhysicalInconsistency(source) => {
                    SimulationError::PhysicalInconsistency {
                        hour: t_it.index,
                        timestamp: t_it.timestamp,
                        source,
                    }
                }
                StorageTankError::MissingConsumptionHour(time_of_day) => {
                    ConfigurationError::new(
                        ComponentId::StorageTank,
                        format!(
                            "consumption pattern has no entry for {} (hour {} of the run, {})",
                            format_time_of_day(time_of_day),
                            t_it.index,
                            t_it.timestamp
                        ),
                    )
                    .into()
                }
            })?;

        self.circulation_pump
            .adjust(water_temp_into_solar, water_temp_out_of_solar);

        debug!(
            "Starting flow rate: {flow_rate}, starting temp into solar {water_temp_into_solar}, ending temp in pipes {water_temp_out_of_solar}, ending temp water container {}",
            self.storage_tank.outgoing_water_temp()
        );

        Ok(())
    }

    fn result_row(&self, t_it: &SimulationTimeIteration) -> HourlyResultRow {
        let solar = self.solar_collector.metrics();
        let pump = self.circulation_pump.metrics();
        let tank = self.storage_tank.metrics();

        HourlyResultRow {
            simulation_uuid: self.simulation_uuid.clone(),
            timestamp: t_it.timestamp,
            direct_normal_irradiance: self.current_direct_normal_irradiance,
            water_temp_into_solar: solar.water_temp_in,
            water_temp_out_of_solar: solar.water_temp_out,
            energy_captured_by_solar: solar.energy_captured,
            solar_efficiency: solar.efficiency,
            water_flow_rate: solar.water_flow_rate,
            percent_of_max_flow_rate_used: pump.percent_of_max_flow_rate,
            average_water_temperature: tank.average_water_temp,
            thermal_energy_in_container: tank.thermal_energy,
            average_temperature_of_water_sent_out: tank.temp_of_water_sent_out,
            energy_sent_out: tank.energy_sent_out,
            volume_of_water_sent_out: tank.volume_of_water_sent_out,
            energy_consumed_by_heater: tank.energy_consumed_by_heater,
            energy_absorbed_from_pipes: tank.energy_absorbed_from_pipes,
        }
    }
}
