use serde::{Deserialize, Serialize};

/// Instantaneous state of the reactor and its jacket.
///
/// Values are in SI units: mol/m³ for the concentration and kelvin for both
/// temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactorState {
    /// Concentration of species A in the reactor, `cA`.
    pub concentration: f64,

    /// Reactor contents temperature, `T`.
    pub temperature: f64,

    /// Jacket coolant temperature, `T_J`.
    pub jacket_temperature: f64,
}

/// Time derivative of a [`ReactorState`], per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorDerivative {
    pub concentration: f64,
    pub temperature: f64,
    pub jacket_temperature: f64,
}

impl From<[f64; 3]> for ReactorState {
    fn from([concentration, temperature, jacket_temperature]: [f64; 3]) -> Self {
        Self {
            concentration,
            temperature,
            jacket_temperature,
        }
    }
}

impl From<ReactorState> for [f64; 3] {
    fn from(state: ReactorState) -> Self {
        [
            state.concentration,
            state.temperature,
            state.jacket_temperature,
        ]
    }
}

impl From<ReactorDerivative> for [f64; 3] {
    fn from(derivative: ReactorDerivative) -> Self {
        [
            derivative.concentration,
            derivative.temperature,
            derivative.jacket_temperature,
        ]
    }
}
