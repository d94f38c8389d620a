use cstr_core::Model;
use thiserror::Error;
use uom::si::{
    area::square_meter, frequency::hertz, heat_transfer::watt_per_square_meter_kelvin,
    mass_density::kilogram_per_cubic_meter, molar_concentration::mole_per_cubic_meter,
    molar_energy::joule_per_mole, molar_heat_capacity::joule_per_kelvin_mole,
    specific_heat_capacity::joule_per_kilogram_kelvin, thermodynamic_temperature::kelvin,
    volume::cubic_meter, volume_rate::cubic_meter_per_second,
};

use crate::{
    DisturbanceSchedule, ExogenousInputs, ModelParameters, ReactorDerivative, ReactorState,
};

/// Concentrations down to this fraction of the feed concentration below zero
/// are accepted as integration noise.
const CONCENTRATION_TOLERANCE: f64 = 1.0e-3;

/// A jacketed CSTR running a single irreversible first-order reaction `A -> B`.
///
/// The reactor is perfectly mixed at constant volume and density, with the
/// Arrhenius rate constant `k(T) = A exp(-Ea / (R T))`:
///
/// ```text
/// dcA/dt = F0/V (cA0 - cA) - k cA
/// dT/dt  = F0/V (T0 - T) + H_Rx k cA / (ρ cP) - U_J A_J (T - T_J) / (ρ cP V)
/// dTJ/dt = F_J/V_J (T_J0 - T_J) + U_J A_J (T - T_J) / (ρ_J cP_J V_J)
/// ```
///
/// The feed temperature `T0` and coolant flow `F_J` follow the
/// [`DisturbanceSchedule`]; every other quantity is a fixed parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorJacket {
    parameters: ModelParameters,
    schedule: DisturbanceSchedule,
    coefficients: Coefficients,
}

/// Parameter groups used by the vector field, in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    /// `F0 / V` in 1/s.
    dilution_rate: f64,
    /// `cA0` in mol/m³.
    feed_concentration: f64,
    /// `A` in 1/s.
    pre_exponential_factor: f64,
    /// `Ea / R` in K.
    activation_temperature: f64,
    /// `H_Rx / (ρ cP)` in K·m³/mol.
    adiabatic_heating: f64,
    /// `ρ cP V` in J/K.
    reactor_heat_capacity: f64,
    /// `U_J A_J` in W/K.
    conductance: f64,
    /// `ρ_J cP_J V_J` in J/K.
    jacket_heat_capacity: f64,
    /// `V_J` in m³.
    jacket_volume: f64,
    /// `T_J0` in K.
    coolant_temperature: f64,
}

impl Coefficients {
    fn new(parameters: &ModelParameters) -> Self {
        let p = parameters;
        let density = p.density().get::<kilogram_per_cubic_meter>();
        let heat_capacity = p.heat_capacity().get::<joule_per_kilogram_kelvin>();
        let volume = p.volume().get::<cubic_meter>();
        let jacket_volume = p.jacket_volume().get::<cubic_meter>();

        Self {
            dilution_rate: p.feed_flow().get::<cubic_meter_per_second>() / volume,
            feed_concentration: p.feed_concentration().get::<mole_per_cubic_meter>(),
            pre_exponential_factor: p.pre_exponential_factor().get::<hertz>(),
            activation_temperature: p.activation_energy().get::<joule_per_mole>()
                / p.gas_constant().get::<joule_per_kelvin_mole>(),
            adiabatic_heating: p.heat_of_reaction().get::<joule_per_mole>()
                / (density * heat_capacity),
            reactor_heat_capacity: density * heat_capacity * volume,
            conductance: p.jacket_heat_transfer().get::<watt_per_square_meter_kelvin>()
                * p.jacket_area().get::<square_meter>(),
            jacket_heat_capacity: p.coolant_density().get::<kilogram_per_cubic_meter>()
                * p.coolant_heat_capacity().get::<joule_per_kilogram_kelvin>()
                * jacket_volume,
            jacket_volume,
            coolant_temperature: p.coolant_temperature().get::<kelvin>(),
        }
    }
}

/// Input to [`ReactorJacket`]: a state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorInput {
    /// Time in seconds.
    pub time: f64,
    pub state: ReactorState,
}

/// Output of [`ReactorJacket`] for one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorOutput {
    /// Arrhenius rate constant in 1/s.
    pub rate_constant: f64,

    /// Exogenous inputs in effect at the input time.
    pub inputs: ExogenousInputs,

    /// Heat flow from the reactor contents into the jacket in watts.
    pub jacket_heat_flow: f64,

    /// Time derivative of the state.
    pub derivative: ReactorDerivative,
}

/// A state the vector field cannot be evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    #[error("reactor temperature {temperature} K at t = {time} s is not a positive finite value")]
    ReactorTemperature { time: f64, temperature: f64 },

    #[error("jacket temperature {temperature} K at t = {time} s is not a positive finite value")]
    JacketTemperature { time: f64, temperature: f64 },

    #[error("concentration {concentration} mol/m³ at t = {time} s is negative or not finite")]
    Concentration { time: f64, concentration: f64 },
}

impl DomainError {
    /// Returns the time at which the violation occurred.
    #[must_use]
    pub fn time(&self) -> f64 {
        match self {
            Self::ReactorTemperature { time, .. }
            | Self::JacketTemperature { time, .. }
            | Self::Concentration { time, .. } => *time,
        }
    }
}

impl ReactorJacket {
    /// Creates the model from validated parameters and a disturbance schedule.
    #[must_use]
    pub fn new(parameters: ModelParameters, schedule: DisturbanceSchedule) -> Self {
        Self {
            coefficients: Coefficients::new(&parameters),
            parameters,
            schedule,
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    #[must_use]
    pub fn schedule(&self) -> &DisturbanceSchedule {
        &self.schedule
    }

    /// Returns the Arrhenius rate constant at `temperature` kelvin.
    #[must_use]
    pub fn rate_constant(&self, temperature: f64) -> f64 {
        let c = &self.coefficients;
        c.pre_exponential_factor * (-c.activation_temperature / temperature).exp()
    }

    fn check_domain(&self, input: &ReactorInput) -> Result<(), DomainError> {
        let ReactorInput { time, state } = *input;
        let floor = -CONCENTRATION_TOLERANCE * self.coefficients.feed_concentration;

        if !(state.temperature.is_finite() && state.temperature > 0.0) {
            return Err(DomainError::ReactorTemperature {
                time,
                temperature: state.temperature,
            });
        }
        if !(state.jacket_temperature.is_finite() && state.jacket_temperature > 0.0) {
            return Err(DomainError::JacketTemperature {
                time,
                temperature: state.jacket_temperature,
            });
        }
        if !(state.concentration.is_finite() && state.concentration >= floor) {
            return Err(DomainError::Concentration {
                time,
                concentration: state.concentration,
            });
        }
        Ok(())
    }
}

impl Model for ReactorJacket {
    type Input = ReactorInput;
    type Output = ReactorOutput;
    type Error = DomainError;

    fn call(&self, input: &ReactorInput) -> Result<ReactorOutput, DomainError> {
        self.check_domain(input)?;

        let c = &self.coefficients;
        let ReactorState {
            concentration: ca,
            temperature: t,
            jacket_temperature: tj,
        } = input.state;
        let inputs = self.schedule.inputs_at(&self.parameters, input.time);

        let rate_constant = self.rate_constant(t);
        let reaction_rate = rate_constant * ca;
        let jacket_heat_flow = c.conductance * (t - tj);

        let derivative = ReactorDerivative {
            concentration: c.dilution_rate * (c.feed_concentration - ca) - reaction_rate,
            temperature: c.dilution_rate * (inputs.feed_temperature - t)
                + c.adiabatic_heating * reaction_rate
                - jacket_heat_flow / c.reactor_heat_capacity,
            jacket_temperature: inputs.coolant_flow / c.jacket_volume
                * (c.coolant_temperature - tj)
                + jacket_heat_flow / c.jacket_heat_capacity,
        };

        Ok(ReactorOutput {
            rate_constant,
            inputs,
            jacket_heat_flow,
            derivative,
        })
    }
}
