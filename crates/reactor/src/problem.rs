use std::convert::Infallible;

use cstr_core::OdeProblem;

use crate::{ReactorInput, ReactorOutput, ReactorState};

/// Integrates [`ReactorJacket`](crate::ReactorJacket) in time.
///
/// The state vector is `[cA, T, T_J]` and the independent variable is time in
/// seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactorProblem;

impl OdeProblem for ReactorProblem {
    type Input = ReactorInput;
    type Output = ReactorOutput;
    type Delta = f64;
    type State = [f64; 3];
    type Error = Infallible;

    fn state(&self, input: &ReactorInput) -> Result<[f64; 3], Infallible> {
        Ok(input.state.into())
    }

    fn derivative(
        &self,
        _input: &ReactorInput,
        output: &ReactorOutput,
    ) -> Result<[f64; 3], Infallible> {
        Ok(output.derivative.into())
    }

    fn build_input(
        &self,
        base: &ReactorInput,
        state: &[f64; 3],
        delta: &f64,
    ) -> Result<ReactorInput, Infallible> {
        Ok(ReactorInput {
            time: base.time + delta,
            state: ReactorState::from(*state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_input_relative_to_base() {
        let base = ReactorInput {
            time: 100.0,
            state: ReactorState {
                concentration: 8000.0,
                temperature: 295.0,
                jacket_temperature: 294.5,
            },
        };

        let input = ReactorProblem
            .build_input(&base, &[7000.0, 300.0, 296.0], &2.5)
            .unwrap();

        assert_eq!(input.time, 102.5);
        assert_eq!(ReactorProblem.state(&input).unwrap(), [7000.0, 300.0, 296.0]);
        assert_eq!(ReactorProblem.state(&base).unwrap(), [8000.0, 295.0, 294.5]);
    }
}
