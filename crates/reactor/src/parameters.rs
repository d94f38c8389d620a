use cstr_core::constraint::{Constrained, ConstraintError, NonNegative, StrictlyPositive};
use serde::{Deserialize, Serialize};
use uom::si::{
    area::square_meter,
    f64::{
        Area, Frequency, HeatTransfer, MassDensity, MolarConcentration, MolarEnergy,
        MolarHeatCapacity, SpecificHeatCapacity, ThermodynamicTemperature, Volume, VolumeRate,
    },
    frequency::hertz,
    heat_transfer::watt_per_square_meter_kelvin,
    mass_density::kilogram_per_cubic_meter,
    molar_concentration::mole_per_cubic_meter,
    molar_energy::joule_per_mole,
    molar_heat_capacity::joule_per_kelvin_mole,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermodynamic_temperature::kelvin,
    volume::cubic_meter,
    volume_rate::cubic_meter_per_second,
};

use crate::ConfigurationError;

/// Unvalidated physical constants of the reactor, its feed, and its jacket.
///
/// Quantities serialize as bare numbers in SI base units, so a TOML file
/// lists `volume = 1.36` for a reactor of 1.36 m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterConfig {
    /// Reactor liquid volume `V`.
    pub volume: Volume,

    /// Arrhenius activation energy `Ea`.
    pub activation_energy: MolarEnergy,

    /// Arrhenius pre-exponential factor `A`.
    pub pre_exponential_factor: Frequency,

    /// Heat of reaction `H_Rx`, positive when the reaction heats the contents.
    ///
    /// This is the reverse of the usual exothermic convention. The reference
    /// data relies on it, so the sign of values taken from other sources must
    /// be checked against the energy balance in
    /// [`ReactorJacket`](crate::ReactorJacket).
    pub heat_of_reaction: MolarEnergy,

    /// Density of the reacting mixture `ρ`.
    pub density: MassDensity,

    /// Heat capacity of the reacting mixture `cP`.
    pub heat_capacity: SpecificHeatCapacity,

    /// Nominal feed volumetric flow `F0`.
    pub feed_flow: VolumeRate,

    /// Feed concentration of species A `cA0`.
    pub feed_concentration: MolarConcentration,

    /// Nominal feed temperature `T0`.
    pub feed_temperature: ThermodynamicTemperature,

    /// Overall heat transfer coefficient between reactor and jacket `U_J`.
    pub jacket_heat_transfer: HeatTransfer,

    /// Heat transfer area between reactor and jacket `A_J`.
    pub jacket_area: Area,

    /// Coolant density `ρ_J`.
    pub coolant_density: MassDensity,

    /// Coolant heat capacity `cP_J`.
    pub coolant_heat_capacity: SpecificHeatCapacity,

    /// Jacket coolant volume `V_J`.
    pub jacket_volume: Volume,

    /// Nominal coolant volumetric flow `F_J0`.
    pub coolant_flow: VolumeRate,

    /// Coolant inlet temperature `T_J0`.
    pub coolant_temperature: ThermodynamicTemperature,

    /// Universal gas constant `R`.
    pub gas_constant: MolarHeatCapacity,
}

impl ParameterConfig {
    /// Returns the reference reactor: a 1.36 m³ tank cooled by a 0.109 m³ jacket.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            volume: Volume::new::<cubic_meter>(1.36),
            activation_energy: MolarEnergy::new::<joule_per_mole>(69_795.0),
            pre_exponential_factor: Frequency::new::<hertz>(19_666_666.67),
            heat_of_reaction: MolarEnergy::new::<joule_per_mole>(69_795.0),
            density: MassDensity::new::<kilogram_per_cubic_meter>(801.0),
            heat_capacity: SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(3140.0),
            feed_flow: VolumeRate::new::<cubic_meter_per_second>(3.0e-4),
            feed_concentration: MolarConcentration::new::<mole_per_cubic_meter>(8007.46),
            feed_temperature: ThermodynamicTemperature::new::<kelvin>(294.4),
            jacket_heat_transfer: HeatTransfer::new::<watt_per_square_meter_kelvin>(851.7),
            jacket_area: Area::new::<square_meter>(23.23),
            coolant_density: MassDensity::new::<kilogram_per_cubic_meter>(998.0),
            coolant_heat_capacity: SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(
                4187.0,
            ),
            jacket_volume: Volume::new::<cubic_meter>(0.1090),
            coolant_flow: VolumeRate::new::<cubic_meter_per_second>(0.000_392_5),
            coolant_temperature: ThermodynamicTemperature::new::<kelvin>(294.4),
            gas_constant: MolarHeatCapacity::new::<joule_per_kelvin_mole>(8.314),
        }
    }
}

/// Validated, immutable physical constants of the reactor system.
///
/// Sizes, densities, heat capacities, the activation energy, the gas constant,
/// and both inlet temperatures must be strictly positive. Flows and the
/// pre-exponential factor may be zero, which turns off the corresponding
/// process. The heat of reaction may take either sign but must be finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    volume: Constrained<Volume, StrictlyPositive>,
    activation_energy: Constrained<MolarEnergy, StrictlyPositive>,
    pre_exponential_factor: Constrained<Frequency, NonNegative>,
    heat_of_reaction: MolarEnergy,
    density: Constrained<MassDensity, StrictlyPositive>,
    heat_capacity: Constrained<SpecificHeatCapacity, StrictlyPositive>,
    feed_flow: Constrained<VolumeRate, NonNegative>,
    feed_concentration: Constrained<MolarConcentration, StrictlyPositive>,
    feed_temperature: Constrained<f64, StrictlyPositive>,
    jacket_heat_transfer: Constrained<HeatTransfer, NonNegative>,
    jacket_area: Constrained<Area, StrictlyPositive>,
    coolant_density: Constrained<MassDensity, StrictlyPositive>,
    coolant_heat_capacity: Constrained<SpecificHeatCapacity, StrictlyPositive>,
    jacket_volume: Constrained<Volume, StrictlyPositive>,
    coolant_flow: Constrained<VolumeRate, NonNegative>,
    coolant_temperature: Constrained<f64, StrictlyPositive>,
    gas_constant: Constrained<MolarHeatCapacity, StrictlyPositive>,
}

impl ModelParameters {
    /// Validates a parameter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parameter`] naming the first parameter
    /// that violates its constraint.
    pub fn new(config: ParameterConfig) -> Result<Self, ConfigurationError> {
        let ParameterConfig {
            volume,
            activation_energy,
            pre_exponential_factor,
            heat_of_reaction,
            density,
            heat_capacity,
            feed_flow,
            feed_concentration,
            feed_temperature,
            jacket_heat_transfer,
            jacket_area,
            coolant_density,
            coolant_heat_capacity,
            jacket_volume,
            coolant_flow,
            coolant_temperature,
            gas_constant,
        } = config;

        if !heat_of_reaction.get::<joule_per_mole>().is_finite() {
            return Err(ConfigurationError::parameter(
                "heat_of_reaction",
                ConstraintError::NotFinite,
            ));
        }

        Ok(Self {
            volume: checked("volume", volume)?,
            activation_energy: checked("activation_energy", activation_energy)?,
            pre_exponential_factor: checked("pre_exponential_factor", pre_exponential_factor)?,
            heat_of_reaction,
            density: checked("density", density)?,
            heat_capacity: checked("heat_capacity", heat_capacity)?,
            feed_flow: checked("feed_flow", feed_flow)?,
            feed_concentration: checked("feed_concentration", feed_concentration)?,
            feed_temperature: checked("feed_temperature", feed_temperature.get::<kelvin>())?,
            jacket_heat_transfer: checked("jacket_heat_transfer", jacket_heat_transfer)?,
            jacket_area: checked("jacket_area", jacket_area)?,
            coolant_density: checked("coolant_density", coolant_density)?,
            coolant_heat_capacity: checked("coolant_heat_capacity", coolant_heat_capacity)?,
            jacket_volume: checked("jacket_volume", jacket_volume)?,
            coolant_flow: checked("coolant_flow", coolant_flow)?,
            coolant_temperature: checked(
                "coolant_temperature",
                coolant_temperature.get::<kelvin>(),
            )?,
            gas_constant: checked("gas_constant", gas_constant)?,
        })
    }

    /// Returns the validated reference parameters.
    #[must_use]
    pub fn reference() -> Self {
        Self::new(ParameterConfig::reference()).expect("reference parameters are always valid")
    }

    /// Returns the parameters as a plain configuration record.
    #[must_use]
    pub fn to_config(&self) -> ParameterConfig {
        ParameterConfig {
            volume: self.volume(),
            activation_energy: self.activation_energy(),
            pre_exponential_factor: self.pre_exponential_factor(),
            heat_of_reaction: self.heat_of_reaction(),
            density: self.density(),
            heat_capacity: self.heat_capacity(),
            feed_flow: self.feed_flow(),
            feed_concentration: self.feed_concentration(),
            feed_temperature: self.feed_temperature(),
            jacket_heat_transfer: self.jacket_heat_transfer(),
            jacket_area: self.jacket_area(),
            coolant_density: self.coolant_density(),
            coolant_heat_capacity: self.coolant_heat_capacity(),
            jacket_volume: self.jacket_volume(),
            coolant_flow: self.coolant_flow(),
            coolant_temperature: self.coolant_temperature(),
            gas_constant: self.gas_constant(),
        }
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume.into_inner()
    }

    #[must_use]
    pub fn activation_energy(&self) -> MolarEnergy {
        self.activation_energy.into_inner()
    }

    #[must_use]
    pub fn pre_exponential_factor(&self) -> Frequency {
        self.pre_exponential_factor.into_inner()
    }

    #[must_use]
    pub fn heat_of_reaction(&self) -> MolarEnergy {
        self.heat_of_reaction
    }

    #[must_use]
    pub fn density(&self) -> MassDensity {
        self.density.into_inner()
    }

    #[must_use]
    pub fn heat_capacity(&self) -> SpecificHeatCapacity {
        self.heat_capacity.into_inner()
    }

    #[must_use]
    pub fn feed_flow(&self) -> VolumeRate {
        self.feed_flow.into_inner()
    }

    #[must_use]
    pub fn feed_concentration(&self) -> MolarConcentration {
        self.feed_concentration.into_inner()
    }

    #[must_use]
    pub fn feed_temperature(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(self.feed_temperature.into_inner())
    }

    #[must_use]
    pub fn jacket_heat_transfer(&self) -> HeatTransfer {
        self.jacket_heat_transfer.into_inner()
    }

    #[must_use]
    pub fn jacket_area(&self) -> Area {
        self.jacket_area.into_inner()
    }

    #[must_use]
    pub fn coolant_density(&self) -> MassDensity {
        self.coolant_density.into_inner()
    }

    #[must_use]
    pub fn coolant_heat_capacity(&self) -> SpecificHeatCapacity {
        self.coolant_heat_capacity.into_inner()
    }

    #[must_use]
    pub fn jacket_volume(&self) -> Volume {
        self.jacket_volume.into_inner()
    }

    #[must_use]
    pub fn coolant_flow(&self) -> VolumeRate {
        self.coolant_flow.into_inner()
    }

    #[must_use]
    pub fn coolant_temperature(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(self.coolant_temperature.into_inner())
    }

    #[must_use]
    pub fn gas_constant(&self) -> MolarHeatCapacity {
        self.gas_constant.into_inner()
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::reference()
    }
}

/// Wraps `value` in a constraint, tagging failures with the parameter name.
fn checked<T, C>(
    parameter: &'static str,
    value: T,
) -> Result<Constrained<T, C>, ConfigurationError>
where
    C: cstr_core::constraint::Constraint<T>,
{
    Constrained::new(value).map_err(|source| ConfigurationError::parameter(parameter, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn reference_parameters_are_valid() {
        let parameters = ModelParameters::new(ParameterConfig::reference()).unwrap();

        assert_relative_eq!(parameters.volume().get::<cubic_meter>(), 1.36);
        assert_relative_eq!(parameters.feed_temperature().get::<kelvin>(), 294.4);
        assert_relative_eq!(
            parameters.feed_concentration().get::<mole_per_cubic_meter>(),
            8007.46
        );
        assert_eq!(parameters.to_config(), ParameterConfig::reference());
    }

    #[test]
    fn zero_volume_is_rejected() {
        let config = ParameterConfig {
            volume: Volume::new::<cubic_meter>(0.0),
            ..ParameterConfig::reference()
        };

        assert_eq!(
            ModelParameters::new(config).unwrap_err(),
            ConfigurationError::Parameter {
                parameter: "volume",
                source: ConstraintError::Zero,
            }
        );
    }

    #[test]
    fn negative_coolant_flow_is_rejected() {
        let config = ParameterConfig {
            coolant_flow: VolumeRate::new::<cubic_meter_per_second>(-1.0e-4),
            ..ParameterConfig::reference()
        };

        assert_eq!(
            ModelParameters::new(config).unwrap_err(),
            ConfigurationError::Parameter {
                parameter: "coolant_flow",
                source: ConstraintError::Negative,
            }
        );
    }

    #[test]
    fn absolute_zero_feed_temperature_is_rejected() {
        let config = ParameterConfig {
            feed_temperature: ThermodynamicTemperature::new::<kelvin>(0.0),
            ..ParameterConfig::reference()
        };

        assert!(matches!(
            ModelParameters::new(config),
            Err(ConfigurationError::Parameter {
                parameter: "feed_temperature",
                ..
            })
        ));
    }

    #[test]
    fn non_finite_heat_of_reaction_is_rejected() {
        for value in [f64::NAN, f64::INFINITY] {
            let config = ParameterConfig {
                heat_of_reaction: MolarEnergy::new::<joule_per_mole>(value),
                ..ParameterConfig::reference()
            };

            assert_eq!(
                ModelParameters::new(config).unwrap_err(),
                ConfigurationError::Parameter {
                    parameter: "heat_of_reaction",
                    source: ConstraintError::NotFinite,
                }
            );
        }
    }

    #[test]
    fn reaction_and_flows_may_be_switched_off() {
        let config = ParameterConfig {
            pre_exponential_factor: Frequency::new::<hertz>(0.0),
            coolant_flow: VolumeRate::new::<cubic_meter_per_second>(0.0),
            heat_of_reaction: MolarEnergy::new::<joule_per_mole>(-5.0e4),
            ..ParameterConfig::reference()
        };

        assert!(ModelParameters::new(config).is_ok());
    }
}
