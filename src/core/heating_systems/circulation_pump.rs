use crate::input::WaterPumpInput;
use serde::Serialize;

const FLOW_RATE_INCREASE_FACTOR: f64 = 1.20;
const FLOW_RATE_DECREASE_FACTOR: f64 = 0.70;

/// An object to represent the pump circulating water between the storage tank and the collector
///
/// The pump reacts to the temperature rise it saw across the collector during the previous hour,
/// so its flow rate for the current hour always lags the conditions it is responding to.
#[derive(Clone, Debug, PartialEq)]
pub struct CirculationPump {
    min_flow_rate: f64, // litres/minute
    max_flow_rate: f64, // litres/minute
    min_temp_difference: f64,
    max_temp_difference: f64,
    current_flow_rate: f64,
    percent_of_max_flow_rate: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CirculationPumpMetrics {
    pub flow_rate: f64,
    pub percent_of_max_flow_rate: f64,
}

impl CirculationPump {
    /// Arguments:
    /// * `min_flow_rate` - lowest flow rate the pump will settle at, in litres/minute
    /// * `max_flow_rate` - highest flow rate the pump can deliver, in litres/minute
    /// * `min_temp_difference` - rise across the collector below which the flow is slowed
    /// * `max_temp_difference` - rise across the collector above which the flow is sped up
    pub fn new(
        min_flow_rate: f64,
        max_flow_rate: f64,
        min_temp_difference: f64,
        max_temp_difference: f64,
    ) -> Self {
        Self {
            min_flow_rate,
            max_flow_rate,
            min_temp_difference,
            max_temp_difference,
            current_flow_rate: min_flow_rate,
            percent_of_max_flow_rate: min_flow_rate / max_flow_rate,
        }
    }

    pub fn from_input(input: &WaterPumpInput) -> Self {
        Self::new(
            input.min_flow_rate,
            input.max_flow_rate,
            input.min_temp_difference,
            input.max_temp_difference,
        )
    }

    pub fn current_flow_rate(&self) -> f64 {
        self.current_flow_rate
    }

    /// Adjust the flow rate for the next hour from the temperature rise seen across the collector.
    ///
    /// A rise below the minimum difference slows the water down so it spends longer in the
    /// collector, while a rise above the maximum difference speeds it up. Each adjustment is a
    /// single multiplicative step, clamped to the pump's flow rate bounds.
    pub fn adjust(&mut self, water_temp_into_solar: f64, water_temp_out_of_solar: f64) {
        let temp_difference = water_temp_out_of_solar - water_temp_into_solar;

        if temp_difference < self.min_temp_difference {
            self.current_flow_rate =
                (self.current_flow_rate * FLOW_RATE_DECREASE_FACTOR).max(self.min_flow_rate);
        } else if temp_difference > self.max_temp_difference {
            self.current_flow_rate =
                (self.current_flow_rate * FLOW_RATE_INCREASE_FACTOR).min(self.max_flow_rate);
        }

        self.percent_of_max_flow_rate = self.current_flow_rate / self.max_flow_rate;
    }

    pub fn metrics(&self) -> CirculationPumpMetrics {
        CirculationPumpMetrics {
            flow_rate: self.current_flow_rate,
            percent_of_max_flow_rate: self.percent_of_max_flow_rate,
        }
    }
}
