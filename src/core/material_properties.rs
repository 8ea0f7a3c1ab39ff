use std::sync::LazyLock;

/// This module contains data on the properties of the working fluid.
///
/// Water is treated as 1 kg per litre, so volumes in litres stand in for masses.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialProperties {
    volumetric_heat_capacity: f64, // J/(litre.K)
}

impl MaterialProperties {
    /// Arguments:
    /// * `density` - in kg/litre
    /// * `specific_heat_capacity` - in J/(kg.K)
    pub fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            volumetric_heat_capacity: specific_heat_capacity * density,
        }
    }

    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.volumetric_heat_capacity
    }

    /// Thermal energy, in J, held by a volume of material at a temperature, measured from 0ºC
    ///
    /// Arguments:
    /// * `volume` - volume of material, in litres
    /// * `temperature` - temperature of the material, in deg C
    pub fn thermal_energy_joules(&self, volume: f64, temperature: f64) -> f64 {
        volume * temperature * self.volumetric_heat_capacity
    }

    /// Temperature change, in K, caused by adding energy to a volume of material
    pub fn temperature_change(&self, energy_joules: f64, volume: f64) -> f64 {
        energy_joules / (self.volumetric_heat_capacity * volume)
    }
}

pub static WATER: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(1.0, 4184.0));

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn matprop() -> MaterialProperties {
        MaterialProperties::new(1.5, 4184.0)
    }

    #[rstest]
    pub fn should_have_correct_volumetric_heat_capacity(matprop: MaterialProperties) {
        assert_eq!(
            matprop.volumetric_heat_capacity(),
            6276.0,
            "incorrect volumetric heat capacity"
        );
    }

    #[rstest]
    pub fn should_treat_water_as_one_kg_per_litre() {
        assert_eq!(WATER.volumetric_heat_capacity(), 4184.0);
    }

    #[rstest]
    pub fn should_calc_thermal_energy_and_invert_it(matprop: MaterialProperties) {
        let energy = matprop.thermal_energy_joules(200., 50.);
        assert_eq!(energy, 62_760_000.);
        assert_relative_eq!(
            matprop.temperature_change(energy, 200.),
            50.,
            max_relative = 1e-12
        );
    }
}
