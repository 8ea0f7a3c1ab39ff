use crate::core::heating_systems::auxiliary_heater::AuxiliaryHeater;
use crate::core::material_properties::{MaterialProperties, WATER};
use crate::core::units::litres_over_one_hour;
use crate::core::water_heat_demand::consumption_pattern::{
    format_time_of_day, ConsumptionPattern, DrawOff,
};
use crate::errors::PhysicalInconsistencyError;
use crate::input::WaterContainerInput;
use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

// average water temperature the tank starts at, in deg C - a safe temperature to prevent bacteria growth
const INITIAL_AVERAGE_WATER_TEMP: f64 = 50.;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StorageTankError {
    #[error(transparent)]
    PhysicalInconsistency(#[from] PhysicalInconsistencyError),
    #[error("consumption pattern has no entry for {}", format_time_of_day(*.0))]
    MissingConsumptionHour(NaiveTime),
}

/// An object to represent an insulated hot water storage tank, modelled as a single mixed volume
///
/// Each hour the tank absorbs heat from the water returning from the solar collector, loses a
/// fraction of its thermal energy to the surroundings and supplies the hot water drawn off for
/// that hour of the day. When the draw-off would leave the tank short of the energy it needs to
/// sit at its minimum average temperature, an auxiliary heater tops it back up to that minimum.
#[derive(Clone, Debug)]
pub struct StorageTank {
    capacity: f64,                // litres
    absorption_fraction: f64,     // fraction of the heat flowing past in the pipes that is absorbed
    loss_fraction_per_hour: f64,  // fraction of thermal energy lost each hour
    cold_feed_temp: f64,          // temperature of the unheated water replacing draw-off, deg C
    min_average_temp: f64,        // deg C
    consumption_pattern: ConsumptionPattern,
    auxiliary_heater: AuxiliaryHeater,
    contents: MaterialProperties,
    current_average_temp: f64,
    current_thermal_energy: f64, // J, measured from 0ºC
    outgoing_water_temp: f64,
    // results for the most recent hour
    energy_absorbed_from_pipes: f64,
    temp_of_water_sent_out: f64,
    volume_of_water_sent_out: f64,
    energy_sent_out: f64,
    energy_consumed_by_heater: f64,
    heater_fired: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StorageTankMetrics {
    pub average_water_temp: f64,
    pub thermal_energy: f64,
    pub temp_of_water_sent_out: f64,
    pub energy_sent_out: f64,
    pub volume_of_water_sent_out: f64,
    pub energy_consumed_by_heater: f64,
    pub energy_absorbed_from_pipes: f64,
    pub heater_fired: bool,
}

impl StorageTank {
    /// Arguments:
    /// * `capacity` - volume of the tank, in litres
    /// * `absorption_fraction` - fraction of the heat carried past the tank by the collector loop
    ///                           that is absorbed into the stored water
    /// * `loss_fraction_per_hour` - fraction of the stored thermal energy lost each hour
    /// * `cold_feed_temp` - temperature of the external water source, in deg C
    /// * `min_average_temp` - minimum average temperature maintained by the auxiliary heater
    /// * `consumption_pattern` - hot water drawn off for each hour of the day
    /// * `auxiliary_heater` - heater used to top up the tank
    pub fn new(
        capacity: f64,
        absorption_fraction: f64,
        loss_fraction_per_hour: f64,
        cold_feed_temp: f64,
        min_average_temp: f64,
        consumption_pattern: ConsumptionPattern,
        auxiliary_heater: AuxiliaryHeater,
    ) -> Self {
        let contents = *WATER;
        let current_average_temp = INITIAL_AVERAGE_WATER_TEMP;

        Self {
            capacity,
            absorption_fraction,
            loss_fraction_per_hour,
            cold_feed_temp,
            min_average_temp,
            consumption_pattern,
            auxiliary_heater,
            contents,
            current_average_temp,
            current_thermal_energy: contents.thermal_energy_joules(capacity, current_average_temp),
            outgoing_water_temp: current_average_temp,
            energy_absorbed_from_pipes: Default::default(),
            temp_of_water_sent_out: Default::default(),
            volume_of_water_sent_out: Default::default(),
            energy_sent_out: Default::default(),
            energy_consumed_by_heater: Default::default(),
            heater_fired: false,
        }
    }

    pub fn from_input(
        input: &WaterContainerInput,
        consumption_pattern: ConsumptionPattern,
    ) -> Self {
        Self::new(
            input.water_capacity,
            input.absorption_fraction,
            input.loss_fraction_per_hour,
            input.temperature_of_external_water_source,
            input.minimum_average_water_temperature,
            consumption_pattern,
            AuxiliaryHeater::new(input.efficiency_of_traditional_boiler),
        )
    }

    pub fn current_average_temp(&self) -> f64 {
        self.current_average_temp
    }

    pub fn current_thermal_energy(&self) -> f64 {
        self.current_thermal_energy
    }

    /// Temperature of the water leaving the tank for the collector loop, in deg C
    pub fn outgoing_water_temp(&self) -> f64 {
        self.outgoing_water_temp
    }

    /// Run one hour of the tank.
    ///
    /// Arguments:
    /// * `temp_in_pipes` - temperature of the water returning from the collector, in deg C
    /// * `flow_rate_in_pipes` - in litres/minute
    /// * `time_of_day` - start of the hour, used to look up the draw-off for the hour
    ///
    /// The steps run in a fixed order: heat absorbed from the pipes, standing losses, then
    /// draw-off with any auxiliary top-up.
    pub fn run_hour(
        &mut self,
        temp_in_pipes: f64,
        flow_rate_in_pipes: f64,
        time_of_day: NaiveTime,
    ) -> Result<(), StorageTankError> {
        self.absorb_heat_from_pipes(temp_in_pipes, flow_rate_in_pipes)?;
        self.apply_standing_losses();

        let draw_off = *self
            .consumption_pattern
            .draw_off_at(time_of_day)
            .ok_or(StorageTankError::MissingConsumptionHour(time_of_day))?;
        self.supply_draw_off(draw_off);

        self.outgoing_water_temp = self.current_average_temp;

        trace!(
            "storage tank at {} - average temp {}, heater fired: {}",
            format_time_of_day(time_of_day),
            self.current_average_temp,
            self.heater_fired
        );

        Ok(())
    }

    fn absorb_heat_from_pipes(
        &mut self,
        temp_in_pipes: f64,
        flow_rate_in_pipes: f64,
    ) -> Result<(), PhysicalInconsistencyError> {
        let temp_difference = temp_in_pipes - self.current_average_temp;
        if temp_difference < 0. {
            return Err(PhysicalInconsistencyError::RetrogradeHeatFlow {
                temp_in_pipes,
                tank_average_temp: self.current_average_temp,
            });
        }

        let energy_flowed = temp_difference
            * self.contents.volumetric_heat_capacity()
            * litres_over_one_hour(flow_rate_in_pipes);
        let energy_absorbed = energy_flowed * self.absorption_fraction;

        self.current_average_temp += self
            .contents
            .temperature_change(energy_absorbed, self.capacity);
        self.recalculate_thermal_energy();
        self.energy_absorbed_from_pipes = energy_absorbed;

        Ok(())
    }

    fn apply_standing_losses(&mut self) {
        self.current_thermal_energy *= 1. - self.loss_fraction_per_hour;
        self.current_average_temp = self
            .contents
            .temperature_change(self.current_thermal_energy, self.capacity);
        self.recalculate_thermal_energy();
    }

    /// Draw-off only reaches the tank temperature through the energy balance: either the balance
    /// is in surplus and the temperature is left alone, or the auxiliary heater restores the tank
    /// to its minimum average temperature.
    fn supply_draw_off(&mut self, draw_off: DrawOff) {
        if !draw_off.removes_heat(self.cold_feed_temp) {
            // replaced entirely from the unheated source, so no thermal effect
            self.temp_of_water_sent_out = 0.;
            self.volume_of_water_sent_out = 0.;
            self.energy_sent_out = 0.;
            self.energy_consumed_by_heater = 0.;
            self.heater_fired = false;
            return;
        }

        let energy_sent_out = self
            .contents
            .thermal_energy_joules(draw_off.volume, draw_off.temperature);
        let energy_of_replacement_water = self
            .contents
            .thermal_energy_joules(draw_off.volume, self.cold_feed_temp);
        let target_energy = self
            .contents
            .thermal_energy_joules(self.capacity, self.min_average_temp);
        let energy_surplus = (self.current_thermal_energy + energy_of_replacement_water
            - energy_sent_out)
            - target_energy;

        self.temp_of_water_sent_out = draw_off.temperature;
        self.volume_of_water_sent_out = draw_off.volume;
        self.energy_sent_out = energy_sent_out;

        match self.auxiliary_heater.energy_to_cover(energy_surplus) {
            Some(energy_consumed_by_heater) => {
                self.energy_consumed_by_heater = energy_consumed_by_heater;
                self.heater_fired = true;
                self.current_average_temp = self.min_average_temp;
                self.recalculate_thermal_energy();
            }
            None => {
                self.energy_consumed_by_heater = 0.;
                self.heater_fired = false;
            }
        }
    }

    fn recalculate_thermal_energy(&mut self) {
        self.current_thermal_energy = self
            .contents
            .thermal_energy_joules(self.capacity, self.current_average_temp);
    }

    pub fn metrics(&self) -> StorageTankMetrics {
        StorageTankMetrics {
            average_water_temp: self.current_average_temp,
            thermal_energy: self.current_thermal_energy,
            temp_of_water_sent_out: self.temp_of_water_sent_out,
            energy_sent_out: self.energy_sent_out,
            volume_of_water_sent_out: self.volume_of_water_sent_out,
            energy_consumed_by_heater: self.energy_consumed_by_heater,
            energy_absorbed_from_pipes: self.energy_absorbed_from_pipes,
            heater_fired: self.heater_fired,
        }
    }
}
