//! Adaptive Dormand–Prince 5(4) solver for ODE problems.
//!
//! The solver reports the solution on a uniform output grid (`k * dt` past the
//! initial input) while choosing its own internal steps between grid points
//! from an embedded local error estimate:
//!
//! ```text
//! y_{n+1} = y_n + h Σ b_i k_i          (5th order, advances the solution)
//! err     = h Σ (b_i - b*_i) k_i       (difference to the embedded 4th order)
//! ```
//!
//! A step is accepted when the RMS of `err / (atol + rtol |y|)` is at most one.
//! Internal steps are shortened to land exactly on each grid point, and the
//! unshortened proposal is carried into the next interval, so the grid spacing
//! sets the reporting resolution without limiting the step-size controller.
//!
//! The explicit pair copes with mildly stiff problems by shrinking its steps to
//! stay stable; the error contract holds either way.
//!
//! # Example
//!
//! ```ignore
//! use cstr_solvers::transient::dormand_prince::{self, Config};
//!
//! let solution =
//!     dormand_prince::solve_unobserved(&model, &problem, initial_input, dt, steps, &Config::default())?;
//!
//! for snapshot in &solution.history {
//!     println!("{:?} -> {:?}", snapshot.input, snapshot.output);
//! }
//! ```

mod action;
mod config;
mod error;
mod event;
mod solution;
mod tableau;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Stats, Status};

use cstr_core::{Model, Observer, OdeProblem, Snapshot, StepIntegrable};

use tableau::*;

/// Safety factor applied to the optimal step-size ratio.
const SAFETY: f64 = 0.9;

/// Smallest allowed ratio between consecutive step sizes.
const MIN_FACTOR: f64 = 0.2;

/// Largest allowed ratio between consecutive step sizes.
const MAX_FACTOR: f64 = 5.0;

/// Most history entries reserved up front; longer runs grow the history as
/// they go.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Integrates an ODE problem with adaptive Dormand–Prince 5(4) steps.
///
/// # Algorithm
///
/// 1. Call the model with the initial input and emit the initial event.
/// 2. For each output point `k * dt`:
///    - Attempt internal steps from the current state, each built from seven
///      stage evaluations (the last one reused as the first stage of the next
///      step).
///    - Accept the step when the scaled error norm is at most one, otherwise
///      shrink the step and retry.
///    - Once a step lands on the output point, record the snapshot and emit an
///      [`Event`] to the observer.
///    - If the observer returns [`Action::StopEarly`], terminate.
/// 3. Return the solution with the full output history.
///
/// Every model input is built from `initial` and an offset, so the output
/// times carry no accumulated round-off.
///
/// # Errors
///
/// Returns an error if `dt` is not finite and positive, if the model or
/// problem fails at any stage, if the step size falls below
/// [`Config::min_step`], or if an output interval needs more than
/// [`Config::max_substeps`] attempts. The partial history is not returned.
pub fn solve<M, P, Obs, const N: usize>(
    model: &M,
    problem: &P,
    initial: M::Input,
    dt: f64,
    steps: usize,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: Clone,
    M::Output: Clone,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64, State = [f64; N]>,
    Obs: Observer<Event<M::Input, M::Output>, Action>,
{
    if !(dt.is_finite() && dt > 0.0) {
        return Err(Error::InvalidOutputStep(dt));
    }

    // Evaluate initial state.
    let initial_output = model.call(&initial).map_err(|err| Error::model(0.0, err))?;
    let mut y = problem
        .state(&initial)
        .map_err(|err| Error::problem(0.0, err))?;
    let mut k1 = problem
        .derivative(&initial, &initial_output)
        .map_err(|err| Error::problem(0.0, err))?;

    let mut stats = Stats {
        evaluations: 1,
        ..Stats::default()
    };

    let initial_snapshot = Snapshot::new(initial.clone(), initial_output);
    let mut history = Vec::with_capacity(steps.saturating_add(1).min(MAX_PREALLOCATED));
    history.push(initial_snapshot.clone());

    // Emit initial event.
    let event = Event {
        step: 0,
        snapshot: initial_snapshot,
        substeps: 0,
        step_size: 0.0,
    };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            history,
            steps: 0,
            stats,
        });
    }

    let mut offset = 0.0;
    let mut h = config
        .initial_step()
        .unwrap_or_else(|| estimate_initial_step(config, &y, &k1))
        .min(dt)
        .min(config.max_step())
        .max(config.min_step());

    for step in 1..=steps {
        let target = step as f64 * dt;
        let mut attempts = 0;
        let mut substeps = 0;
        let mut rejected_last = false;

        let (snapshot, step_size) = loop {
            if attempts == config.max_substeps() {
                return Err(Error::MaxSubstepsExceeded {
                    offset,
                    target,
                    max_substeps: config.max_substeps(),
                });
            }
            attempts += 1;

            let remaining = target - offset;
            let lands = h >= remaining - config.min_step();
            let h_try = if lands { remaining } else { h };
            let next_offset = if lands { target } else { offset + h_try };

            let stage = |c: f64, state: &[f64; N]| {
                evaluate(model, problem, &initial, offset + c * h_try, state)
                    .map(|stage| stage.derivative)
            };

            let k2 = stage(C2, &y.step(slope(&[(A21, &k1)]), h_try))?;
            let k3 = stage(C3, &y.step(slope(&[(A31, &k1), (A32, &k2)]), h_try))?;
            let k4 = stage(
                C4,
                &y.step(slope(&[(A41, &k1), (A42, &k2), (A43, &k3)]), h_try),
            )?;
            let k5 = stage(
                C5,
                &y.step(
                    slope(&[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
                    h_try,
                ),
            )?;
            let k6 = stage(
                1.0,
                &y.step(
                    slope(&[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)]),
                    h_try,
                ),
            )?;

            let y_new = y.step(
                slope(&[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)]),
                h_try,
            );
            let last = evaluate(model, problem, &initial, next_offset, &y_new)?;
            stats.evaluations += 6;

            let local_error = slope(&[
                (E1, &k1),
                (E3, &k3),
                (E4, &k4),
                (E5, &k5),
                (E6, &k6),
                (E7, &last.derivative),
            ])
            .map(|e| e * h_try);
            let err = error_norm(config, &y, &y_new, &local_error);

            if err <= 1.0 {
                stats.accepted += 1;
                substeps += 1;

                let mut factor = step_factor(err);
                if rejected_last {
                    factor = factor.min(1.0);
                }
                let proposal = (h_try * factor).min(config.max_step());
                h = if lands { h.max(proposal) } else { proposal };

                offset = next_offset;
                y = y_new;
                k1 = last.derivative;
                rejected_last = false;

                if lands {
                    break (Snapshot::new(last.input, last.output), h_try);
                }
            } else {
                stats.rejected += 1;
                rejected_last = true;
                h = h_try * step_factor(err).min(1.0);
                log::trace!("rejected step of {h_try:e} at offset {offset} (error norm {err:e})");

                if h < config.min_step() {
                    return Err(Error::StepSizeUnderflow { offset, step: h });
                }
            }
        };

        history.push(snapshot.clone());

        // Emit event to observer.
        let event = Event {
            step,
            snapshot,
            substeps,
            step_size,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            log::debug!("stopped by observer after {step} of {steps} output steps");
            return Ok(Solution {
                status: Status::StoppedByObserver,
                history,
                steps: step,
                stats,
            });
        }
    }

    log::debug!(
        "completed {steps} output steps: {} accepted, {} rejected, {} evaluations",
        stats.accepted,
        stats.rejected,
        stats.evaluations
    );

    Ok(Solution {
        status: Status::Complete,
        history,
        steps,
        stats,
    })
}

/// Integrates an ODE problem with Dormand–Prince 5(4) without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error under the same conditions as [`solve`].
pub fn solve_unobserved<M, P, const N: usize>(
    model: &M,
    problem: &P,
    initial: M::Input,
    dt: f64,
    steps: usize,
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: Clone,
    M::Output: Clone,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64, State = [f64; N]>,
{
    solve(model, problem, initial, dt, steps, config, ())
}

/// A model evaluation at a trial state.
struct Stage<I, O, const N: usize> {
    input: I,
    output: O,
    derivative: [f64; N],
}

/// Evaluates the model and derivative at `state`, located `offset` past `base`.
fn evaluate<M, P, const N: usize>(
    model: &M,
    problem: &P,
    base: &M::Input,
    offset: f64,
    state: &[f64; N],
) -> Result<Stage<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64, State = [f64; N]>,
{
    let input = problem
        .build_input(base, state, &offset)
        .map_err(|err| Error::problem(offset, err))?;
    let output = model
        .call(&input)
        .map_err(|err| Error::model(offset, err))?;
    let derivative = problem
        .derivative(&input, &output)
        .map_err(|err| Error::problem(offset, err))?;

    Ok(Stage {
        input,
        output,
        derivative,
    })
}

/// Returns the weighted stage slope `Σ a_i k_i`.
fn slope<const N: usize>(terms: &[(f64, &[f64; N])]) -> [f64; N] {
    std::array::from_fn(|i| terms.iter().map(|(a, k)| a * k[i]).sum::<f64>())
}

/// Returns the RMS of `values` scaled by `atol + rtol * reference`.
fn scaled_rms<const N: usize>(
    config: &Config,
    values: &[f64; N],
    reference: impl Fn(usize) -> f64,
) -> f64 {
    if N == 0 {
        return 0.0;
    }
    let sum: f64 = (0..N)
        .map(|i| (values[i] / (config.atol() + config.rtol() * reference(i))).powi(2))
        .sum();
    (sum / N as f64).sqrt()
}

/// Error norm of a trial step; at most one means the step is accepted.
fn error_norm<const N: usize>(
    config: &Config,
    y: &[f64; N],
    y_new: &[f64; N],
    local_error: &[f64; N],
) -> f64 {
    scaled_rms(config, local_error, |i| y[i].abs().max(y_new[i].abs()))
}

/// Picks a first step that moves the state by about 1% of its scaled size.
fn estimate_initial_step<const N: usize>(config: &Config, y: &[f64; N], f: &[f64; N]) -> f64 {
    let d0 = scaled_rms(config, y, |i| y[i].abs());
    let d1 = scaled_rms(config, f, |i| y[i].abs());

    if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
}

/// Ratio between the next and current step sizes for a given error norm.
fn step_factor(err: f64) -> f64 {
    if err == 0.0 {
        MAX_FACTOR
    } else if !err.is_finite() {
        MIN_FACTOR
    } else {
        (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use cstr_core::DerivativeOf;
    use thiserror::Error as ThisError;

    // --- Test fixtures ---

    #[derive(Debug, Clone, Copy)]
    struct Input<const N: usize> {
        time: f64,
        state: [f64; N],
    }

    #[derive(Debug, Clone, Copy)]
    struct Output<const N: usize> {
        derivative: [f64; N],
    }

    /// dy/dt = -rate * y
    struct Decay {
        rate: f64,
    }

    impl Model for Decay {
        type Input = Input<1>;
        type Output = Output<1>;
        type Error = std::convert::Infallible;

        fn call(&self, input: &Input<1>) -> Result<Output<1>, Self::Error> {
            Ok(Output {
                derivative: [-self.rate * input.state[0]],
            })
        }
    }

    /// x'' = -x, written as [x, v].
    struct Oscillator;

    impl Model for Oscillator {
        type Input = Input<2>;
        type Output = Output<2>;
        type Error = std::convert::Infallible;

        fn call(&self, input: &Input<2>) -> Result<Output<2>, Self::Error> {
            let [x, v] = input.state;
            Ok(Output {
                derivative: [v, -x],
            })
        }
    }

    #[derive(Debug, ThisError)]
    #[error("model undefined past t = {0}")]
    struct OutOfRange(f64);

    /// Constant growth that refuses to evaluate past a cutoff time.
    struct FailsAfter {
        cutoff: f64,
    }

    impl Model for FailsAfter {
        type Input = Input<1>;
        type Output = Output<1>;
        type Error = OutOfRange;

        fn call(&self, input: &Input<1>) -> Result<Output<1>, OutOfRange> {
            if input.time > self.cutoff {
                return Err(OutOfRange(input.time));
            }
            Ok(Output { derivative: [1.0] })
        }
    }

    /// Produces a derivative no step size can resolve.
    struct Undefined;

    impl Model for Undefined {
        type Input = Input<1>;
        type Output = Output<1>;
        type Error = std::convert::Infallible;

        fn call(&self, _input: &Input<1>) -> Result<Output<1>, Self::Error> {
            Ok(Output {
                derivative: [f64::NAN],
            })
        }
    }

    /// Reads the state straight out of the input and the derivative out of the output.
    struct Direct<const N: usize>;

    impl<const N: usize> OdeProblem for Direct<N> {
        type Input = Input<N>;
        type Output = Output<N>;
        type Delta = f64;
        type State = [f64; N];
        type Error = std::convert::Infallible;

        fn state(&self, input: &Input<N>) -> Result<[f64; N], Self::Error> {
            Ok(input.state)
        }

        fn derivative(
            &self,
            _input: &Input<N>,
            output: &Output<N>,
        ) -> Result<DerivativeOf<[f64; N], f64>, Self::Error> {
            Ok(output.derivative)
        }

        fn build_input(
            &self,
            base: &Input<N>,
            state: &[f64; N],
            delta: &f64,
        ) -> Result<Input<N>, Self::Error> {
            Ok(Input {
                time: base.time + delta,
                state: *state,
            })
        }
    }

    fn start<const N: usize>(state: [f64; N]) -> Input<N> {
        Input { time: 0.0, state }
    }

    // --- Tests ---

    #[test]
    fn exponential_decay_matches_analytic_solution() {
        let model = Decay { rate: 0.5 };
        let config = Config::new(1e-8, 1e-10).unwrap();
        let solution = solve_unobserved(&model, &Direct, start([2.0]), 0.25, 40, &config)
            .expect("should solve");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 40);
        assert_eq!(solution.history.len(), 41); // initial + 40 output points

        for (k, snapshot) in solution.history.iter().enumerate() {
            let t = k as f64 * 0.25;
            assert_eq!(snapshot.input.time, t);
            assert_relative_eq!(
                snapshot.input.state[0],
                2.0 * (-0.5 * t).exp(),
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn oscillator_returns_to_start_after_one_period() {
        let steps = 100;
        let config = Config::new(1e-9, 1e-12).unwrap();
        let solution = solve_unobserved(
            &Oscillator,
            &Direct,
            start([1.0, 0.0]),
            2.0 * PI / steps as f64,
            steps,
            &config,
        )
        .expect("should solve");

        let last = solution.history.last().unwrap();
        assert_relative_eq!(last.input.time, 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(last.input.state[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(last.input.state[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn output_snapshots_carry_model_output() {
        let model = Decay { rate: 1.0 };
        let solution =
            solve_unobserved(&model, &Direct, start([1.0]), 0.5, 4, &Config::default())
                .expect("should solve");

        for snapshot in &solution.history {
            assert_relative_eq!(snapshot.output.derivative[0], -snapshot.input.state[0]);
        }
    }

    #[test]
    fn internal_steps_span_coarse_output_intervals() {
        let model = Decay { rate: 0.01 };
        let solution =
            solve_unobserved(&model, &Direct, start([1.0]), 50.0, 4, &Config::default())
                .expect("should solve");

        assert!(solution.stats.accepted > 4, "coarse grid still needs substeps");
        assert_eq!(
            solution.stats.evaluations,
            1 + 6 * (solution.stats.accepted + solution.stats.rejected)
        );
    }

    #[test]
    fn observer_can_stop_early() {
        let model = Decay { rate: 1.0 };
        let observer = |event: &Event<Input<1>, Output<1>>| {
            if event.step >= 3 {
                Some(Action::StopEarly)
            } else {
                None
            }
        };

        let solution = solve(
            &model,
            &Direct,
            start([1.0]),
            0.1,
            100,
            &Config::default(),
            observer,
        )
        .expect("should stop early");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.steps, 3);
        assert_eq!(solution.history.len(), 4); // initial + 3 output points
    }

    #[test]
    fn events_report_substeps() {
        let model = Decay { rate: 1.0 };
        let mut events = Vec::new();

        solve(
            &model,
            &Direct,
            start([1.0]),
            0.5,
            3,
            &Config::default(),
            |event: &Event<Input<1>, Output<1>>| {
                events.push((event.step, event.substeps, event.step_size));
                None
            },
        )
        .expect("should solve");

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], (0, 0, 0.0));
        for (step, substeps, step_size) in &events[1..] {
            assert!(*step > 0);
            assert!(*substeps >= 1);
            assert!(*step_size > 0.0 && *step_size <= 0.5);
        }
    }

    #[test]
    fn zero_steps_returns_initial() {
        let model = Decay { rate: 1.0 };
        let solution =
            solve_unobserved(&model, &Direct, start([5.0]), 0.1, 0, &Config::default())
                .expect("should return initial");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 0);
        assert_eq!(solution.history.len(), 1);
        assert_relative_eq!(solution.history[0].input.state[0], 5.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let model = Decay { rate: 0.3 };
        let run = || {
            solve_unobserved(&model, &Direct, start([1.0]), 0.7, 20, &Config::default())
                .expect("should solve")
        };

        let first: Vec<_> = run().history.iter().map(|s| s.input.state[0]).collect();
        let second: Vec<_> = run().history.iter().map(|s| s.input.state[0]).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn model_error_reports_offset() {
        let model = FailsAfter { cutoff: 0.55 };
        let error = solve_unobserved(&model, &Direct, start([0.0]), 0.1, 10, &Config::default())
            .expect_err("should fail past the cutoff");
        assert!(error.offset().is_some());

        match error {
            Error::Model { offset, ref source } => {
                assert!(offset > 0.55 && offset <= 0.6 + 1e-12, "offset = {offset}");
                assert!(source.to_string().contains("undefined"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_invalid_output_step() {
        let model = Decay { rate: 1.0 };
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let error = solve_unobserved(&model, &Direct, start([1.0]), dt, 10, &Config::default())
                .expect_err("should reject dt");
            assert!(matches!(error, Error::InvalidOutputStep(_)));
            assert_eq!(error.offset(), None);
        }
    }

    #[test]
    fn substep_budget_is_enforced() {
        let model = Decay { rate: 1.0 };
        let config = Config::default()
            .with_initial_step(1e-3)
            .unwrap()
            .with_max_substeps(2)
            .unwrap();

        let error = solve_unobserved(&model, &Direct, start([1.0]), 1.0, 5, &config)
            .expect_err("should run out of substeps");

        match error {
            Error::MaxSubstepsExceeded {
                offset,
                target,
                max_substeps,
            } => {
                assert_eq!(max_substeps, 2);
                assert_eq!(target, 1.0);
                assert!(offset > 0.0 && offset < 1.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_derivative_underflows_step_size() {
        let config = Config::default().with_initial_step(0.1).unwrap();

        let error = solve_unobserved(&Undefined, &Direct, start([1.0]), 1.0, 1, &config)
            .expect_err("should fail");

        assert!(matches!(error, Error::StepSizeUnderflow { offset, .. } if offset == 0.0));
    }

    #[test]
    fn stage_slopes_reproduce_a_uniform_field() {
        let k = [2.0, -3.0];
        let weights = slope(&[(B1, &k), (B3, &k), (B4, &k), (B5, &k), (B6, &k)]);
        assert_relative_eq!(weights[0], 2.0, max_relative = 1e-14);
        assert_relative_eq!(weights[1], -3.0, max_relative = 1e-14);

        let error = slope(&[(E1, &k), (E3, &k), (E4, &k), (E5, &k), (E6, &k), (E7, &k)]);
        assert_relative_eq!(error[0], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn constant_field_advances_state_linearly() {
        let model = FailsAfter {
            cutoff: f64::INFINITY,
        };

        let solution =
            solve_unobserved(&model, &Direct, start([5.0]), 2.0, 10, &Config::default())
                .expect("should solve");

        for (k, snapshot) in solution.history.iter().enumerate() {
            let expected = 5.0 + 2.0 * k as f64;
            assert_relative_eq!(snapshot.input.state[0], expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn unbounded_step_count_does_not_preallocate() {
        let model = Decay { rate: 1.0 };
        let observer = |event: &Event<Input<1>, Output<1>>| {
            (event.step == 3).then_some(Action::StopEarly)
        };

        let solution = solve(
            &model,
            &Direct,
            start([1.0]),
            0.1,
            usize::MAX,
            &Config::default(),
            observer,
        )
        .expect("should solve");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.history.len(), 4);
    }
}
