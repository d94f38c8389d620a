use crate::{DerivativeOf, StepIntegrable};

/// Defines an ODE (ordinary differential equation) problem to be solved.
///
/// An ODE problem extracts a state from model input, computes derivatives from
/// model input and output, and reconstructs model input from a stepped state.
/// This trait lets generic ODE solvers integrate any [`Model`] by working with
/// a state type that implements [`StepIntegrable`].
///
/// [`Model`]: crate::Model
pub trait OdeProblem {
    type Input;
    type Output;
    type Delta;
    type State: StepIntegrable<Self::Delta>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extracts the state from model input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the state cannot be extracted from the input.
    fn state(&self, input: &Self::Input) -> Result<Self::State, Self::Error>;

    /// Computes the derivative of the state from model input and output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be computed.
    fn derivative(
        &self,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Result<DerivativeOf<Self::State, Self::Delta>, Self::Error>;

    /// Builds model input from a state located `delta` past `base`.
    ///
    /// Solvers that take trial steps call this repeatedly with the same `base`
    /// and different offsets, so any non-state fields of the input (time,
    /// boundary conditions, etc.) must be derived from `base` and `delta` only.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the input cannot be constructed from the state.
    fn build_input(
        &self,
        base: &Self::Input,
        state: &Self::State,
        delta: &Self::Delta,
    ) -> Result<Self::Input, Self::Error>;
}
