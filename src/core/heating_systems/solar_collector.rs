use crate::core::material_properties::{MaterialProperties, WATER};
use crate::core::units::{joules_over_one_hour, litres_over_one_hour};
use crate::input::SolarInput;
use serde::Serialize;

/// An object to represent a flat solar thermal collector
///
/// Direct normal irradiance is used as a proxy for the power arriving at the collector, which is
/// an overestimate (it assumes the panel always faces the sun) but keeps the model directional.
/// The captured energy is shared across all the water pumped through the collector during the
/// hour, so slow moving water gets hotter and fast moving water heats a larger volume less.
#[derive(Clone, Debug, PartialEq)]
pub struct SolarCollector {
    surface_area: f64, // m2
    efficiency: f64,   // fraction of incident energy transferred into the water
    contents: MaterialProperties,
    water_temp_in: f64,   // deg C
    water_temp_out: f64,  // deg C
    water_flow_rate: f64, // litres/minute
    energy_captured: f64, // J over the last hour
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SolarCollectorMetrics {
    pub water_temp_in: f64,
    pub water_temp_out: f64,
    pub energy_captured: f64,
    pub efficiency: f64,
    pub water_flow_rate: f64,
}

impl SolarCollector {
    /// Arguments:
    /// * `length` - length of the collector, in m
    /// * `width` - width of the collector, in m
    /// * `efficiency` - fraction (0 to 1) of the incident solar energy that reaches the water
    pub fn new(length: f64, width: f64, efficiency: f64) -> Self {
        Self {
            surface_area: length * width,
            efficiency,
            contents: *WATER,
            water_temp_in: 0.,
            water_temp_out: 0.,
            water_flow_rate: 0.,
            energy_captured: 0.,
        }
    }

    pub fn from_input(input: &SolarInput) -> Self {
        Self::new(input.length, input.width, input.solar_efficiency)
    }

    pub fn surface_area(&self) -> f64 {
        self.surface_area
    }

    /// Add one hour of solar energy to the water passing through the collector.
    ///
    /// Arguments:
    /// * `direct_normal_irradiance` - in W/m2, averaged over the hour (0 at night)
    /// * `flow_rate` - in litres/minute
    /// * `water_temp_in` - temperature of water entering the collector, in deg C
    ///
    /// Returns the temperature of the water leaving the collector, in deg C. With no flow there is
    /// no water to carry energy away, so nothing is captured and the outlet matches the inlet.
    pub fn capture_hour(
        &mut self,
        direct_normal_irradiance: f64,
        flow_rate: f64,
        water_temp_in: f64,
    ) -> f64 {
        let volume_heated = litres_over_one_hour(flow_rate);

        let (energy_captured, temperature_rise) = if volume_heated > 0. {
            let power_captured = direct_normal_irradiance * self.surface_area * self.efficiency;
            let energy_captured = joules_over_one_hour(power_captured);
            (
                energy_captured,
                self.contents
                    .temperature_change(energy_captured, volume_heated),
            )
        } else {
            (0., 0.)
        };

        self.water_temp_in = water_temp_in;
        self.water_temp_out = water_temp_in + temperature_rise;
        self.energy_captured = energy_captured;
        self.water_flow_rate = flow_rate;

        self.water_temp_out
    }

    pub fn metrics(&self) -> SolarCollectorMetrics {
        SolarCollectorMetrics {
            water_temp_in: self.water_temp_in,
            water_temp_out: self.water_temp_out,
            energy_captured: self.energy_captured,
            efficiency: self.efficiency,
            water_flow_rate: self.water_flow_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn solar_collector() -> SolarCollector {
        SolarCollector::new(4.5, 2., 0.15)
    }

    #[rstest]
    pub fn should_have_surface_area_of_length_by_width(solar_collector: SolarCollector) {
        assert_eq!(solar_collector.surface_area(), 9.);
    }

    #[rstest]
    pub fn should_raise_water_temperature_by_captured_energy(
        mut solar_collector: SolarCollector,
    ) {
        // 800 W/m2 * 9 m2 * 0.15 = 1080 W, over an hour 3_888_000 J shared across 600 litres
        let water_temp_out = solar_collector.capture_hour(800., 10., 20.);

        assert_relative_eq!(
            water_temp_out,
            20. + 3_888_000. / (600. * 4184.),
            max_relative = 1e-12
        );
        let metrics = solar_collector.metrics();
        assert_eq!(metrics.water_temp_in, 20.);
        assert_eq!(metrics.water_temp_out, water_temp_out);
        assert_relative_eq!(metrics.energy_captured, 3_888_000., max_relative = 1e-12);
        assert_eq!(metrics.efficiency, 0.15);
        assert_eq!(metrics.water_flow_rate, 10.);
    }

    #[rstest]
    pub fn should_capture_nothing_when_water_is_not_flowing(mut solar_collector: SolarCollector) {
        let water_temp_out = solar_collector.capture_hour(950., 0., 47.5);

        assert_eq!(water_temp_out, 47.5);
        assert_eq!(solar_collector.metrics().energy_captured, 0.);
    }

    #[rstest]
    pub fn should_leave_temperature_unchanged_at_night(mut solar_collector: SolarCollector) {
        assert_eq!(solar_collector.capture_hour(0., 12., 50.), 50.);
        assert_eq!(solar_collector.metrics().energy_captured, 0.);
    }

    #[rstest]
    #[case(0., 5., 40.)]
    #[case(350., 2.4, 51.2)]
    #[case(1020., 20., 65.)]
    pub fn should_give_identical_results_for_identical_collectors(
        #[case] direct_normal_irradiance: f64,
        #[case] flow_rate: f64,
        #[case] water_temp_in: f64,
    ) {
        let mut first = solar_collector();
        let mut second = solar_collector();

        assert_eq!(
            first.capture_hour(direct_normal_irradiance, flow_rate, water_temp_in),
            second.capture_hour(direct_normal_irradiance, flow_rate, water_temp_in)
        );
        assert_eq!(first.metrics(), second.metrics());
    }

    #[rstest]
    #[case(0.)]
    #[case(120.)]
    #[case(900.)]
    pub fn should_never_cool_the_water_when_irradiance_is_non_negative(
        mut solar_collector: SolarCollector,
        #[case] direct_normal_irradiance: f64,
    ) {
        for flow_rate in [0., 0.5, 4., 20.] {
            let water_temp_out = solar_collector.capture_hour(direct_normal_irradiance, flow_rate, 50.);
            assert!(water_temp_out >= 50.);
        }
    }
}
