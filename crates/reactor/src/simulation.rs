use std::ops::ControlFlow;

use cstr_core::constraint::{ConstraintError, StrictlyPositive};
use cstr_solvers::transient::dormand_prince::{self, Action, Config, Event, Status};
use uom::si::{molar_concentration::mole_per_cubic_meter, thermodynamic_temperature::kelvin};

use crate::{
    ConfigurationError, Conversion, DisturbanceSchedule, InvalidInput, ModelParameters,
    ReactorInput, ReactorJacket, ReactorOutput, ReactorProblem, ReactorState, Sample,
    SimulationError, Summary, Trajectory,
};

/// Time horizon, output grid, and solver settings of a run.
///
/// Output samples are reported at `start_time + k * output_step` for
/// `k = 0..=steps`, ending at `end_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationSettings {
    start_time: f64,
    end_time: f64,
    output_step: f64,
    steps: usize,
    solver: Config,
}

/// Relative slack allowed when checking that the horizon divides into steps.
const GRID_TOLERANCE: f64 = 1e-9;

/// Largest number of output steps a run may request.
///
/// Each sample keeps its model output in memory, so this bounds a single run
/// to roughly a gigabyte of history.
pub const MAX_OUTPUT_STEPS: usize = 10_000_000;

impl IntegrationSettings {
    /// Creates settings with the default solver configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if either time is not finite, the
    /// horizon or output step is not positive, the horizon is not a whole
    /// number of output steps, or the grid has more than [`MAX_OUTPUT_STEPS`]
    /// steps.
    pub fn new(
        start_time: f64,
        end_time: f64,
        output_step: f64,
    ) -> Result<Self, ConfigurationError> {
        if !start_time.is_finite() {
            return Err(ConfigurationError::parameter(
                "start_time",
                ConstraintError::NotFinite,
            ));
        }
        if !end_time.is_finite() {
            return Err(ConfigurationError::parameter(
                "end_time",
                ConstraintError::NotFinite,
            ));
        }
        if !output_step.is_finite() {
            return Err(ConfigurationError::parameter(
                "output_step",
                ConstraintError::NotFinite,
            ));
        }
        StrictlyPositive::new(output_step)
            .map_err(|err| ConfigurationError::parameter("output_step", err))?;

        let horizon = end_time - start_time;
        StrictlyPositive::new(horizon)
            .map_err(|err| ConfigurationError::parameter("horizon", err))?;

        let ratio = horizon / output_step;
        if !(ratio.is_finite() && ratio <= MAX_OUTPUT_STEPS as f64) {
            return Err(ConfigurationError::TooManySteps {
                steps: ratio,
                max: MAX_OUTPUT_STEPS,
            });
        }

        let steps = ratio.round();
        if (ratio - steps).abs() > GRID_TOLERANCE * ratio.max(1.0) {
            return Err(ConfigurationError::UnevenGrid {
                horizon,
                output_step,
            });
        }

        Ok(Self {
            start_time,
            end_time,
            output_step,
            steps: steps as usize,
            solver: Config::default(),
        })
    }

    /// Returns one day sampled every second, with default solver tolerances.
    #[must_use]
    pub fn reference() -> Self {
        Self::new(0.0, 86_400.0, 1.0).expect("reference settings are always valid")
    }

    /// Replaces the solver configuration.
    #[must_use]
    pub fn with_solver(self, solver: Config) -> Self {
        Self { solver, ..self }
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    #[must_use]
    pub fn output_step(&self) -> f64 {
        self.output_step
    }

    /// Number of output steps after the initial sample.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn solver(&self) -> &Config {
        &self.solver
    }
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self::reference()
    }
}

/// A configured reactor run, ready to integrate from any initial state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    model: ReactorJacket,
    settings: IntegrationSettings,
}

impl Simulation {
    #[must_use]
    pub fn new(
        parameters: ModelParameters,
        schedule: DisturbanceSchedule,
        settings: IntegrationSettings,
    ) -> Self {
        Self {
            model: ReactorJacket::new(parameters, schedule),
            settings,
        }
    }

    /// Returns the reference run: reference parameters over one day, with the
    /// disturbance applied halfway through.
    #[must_use]
    pub fn reference() -> Self {
        let settings = IntegrationSettings::reference();
        Self::new(
            ModelParameters::reference(),
            DisturbanceSchedule::at_midpoint(settings.start_time(), settings.end_time()),
            settings,
        )
    }

    #[must_use]
    pub fn model(&self) -> &ReactorJacket {
        &self.model
    }

    #[must_use]
    pub fn settings(&self) -> &IntegrationSettings {
        &self.settings
    }

    /// Returns the feed state: feed concentration, feed temperature, and
    /// coolant inlet temperature.
    #[must_use]
    pub fn initial_state(&self) -> ReactorState {
        let parameters = self.model.parameters();
        ReactorState {
            concentration: self.feed_concentration(),
            temperature: parameters.feed_temperature().get::<kelvin>(),
            jacket_temperature: parameters.coolant_temperature().get::<kelvin>(),
        }
    }

    /// Feed concentration in mol/m³.
    #[must_use]
    pub fn feed_concentration(&self) -> f64 {
        self.model
            .parameters()
            .feed_concentration()
            .get::<mole_per_cubic_meter>()
    }

    /// Integrates from `initial` over the full horizon.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NumericDomain`] if any evaluation of the
    /// vector field leaves the physical domain, and
    /// [`SimulationError::IntegrationFailure`] if the solver cannot meet its
    /// tolerances.
    pub fn run(&self, initial: ReactorState) -> Result<Trajectory, SimulationError> {
        self.run_observed(initial, |_| ControlFlow::Continue(()))
    }

    /// Integrates from `initial`, passing each output sample to `on_sample`.
    ///
    /// Returning [`ControlFlow::Break`] ends the run after that sample, and the
    /// trajectory up to it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Simulation::run`].
    pub fn run_observed<F>(
        &self,
        initial: ReactorState,
        mut on_sample: F,
    ) -> Result<Trajectory, SimulationError>
    where
        F: FnMut(&Sample) -> ControlFlow<()>,
    {
        let settings = &self.settings;
        let initial = ReactorInput {
            time: settings.start_time,
            state: initial,
        };

        log::debug!(
            "integrating from t = {} s to {} s in {} output steps",
            settings.start_time,
            settings.end_time,
            settings.steps
        );

        let mut last_valid = None;
        let solution = dormand_prince::solve(
            &self.model,
            &ReactorProblem,
            initial,
            settings.output_step,
            settings.steps,
            &settings.solver,
            |event: &Event<ReactorInput, ReactorOutput>| {
                let sample = Sample::from(&event.snapshot.input);
                last_valid = Some(sample);
                match on_sample(&sample) {
                    ControlFlow::Continue(()) => None,
                    ControlFlow::Break(()) => Some(Action::StopEarly),
                }
            },
        )
        .map_err(|err| {
            log::warn!("simulation stopped: {err}");
            SimulationError::from_solver(err, last_valid)
        })?;

        if solution.status == Status::StoppedByObserver {
            log::debug!("run ended early after {} output steps", solution.steps);
        }

        Ok(Trajectory::from_ordered(
            solution
                .history
                .iter()
                .map(|snapshot| Sample::from(&snapshot.input))
                .collect(),
        ))
    }

    /// Returns a conversion view of `trajectory` against this run's feed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::EmptyTrajectory`] if the trajectory is empty.
    pub fn conversion<'a>(
        &self,
        trajectory: &'a Trajectory,
    ) -> Result<Conversion<'a>, InvalidInput> {
        Conversion::new(trajectory, self.feed_concentration())
    }

    /// Summarizes `trajectory` against this run's feed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::EmptyTrajectory`] if the trajectory is empty.
    pub fn summarize(&self, trajectory: &Trajectory) -> Result<Summary, InvalidInput> {
        Summary::new(trajectory, self.feed_concentration())
    }
}

impl From<&ReactorInput> for Sample {
    fn from(input: &ReactorInput) -> Self {
        Self {
            time: input.time,
            state: input.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::Frequency, frequency::hertz};

    use crate::ParameterConfig;

    #[test]
    fn settings_count_output_steps() {
        let settings = IntegrationSettings::new(0.0, 86_400.0, 1.0).unwrap();
        assert_eq!(settings.steps(), 86_400);

        let settings = IntegrationSettings::new(100.0, 400.0, 0.1).unwrap();
        assert_eq!(settings.steps(), 3000);
    }

    #[test]
    fn uneven_grid_is_rejected() {
        assert_eq!(
            IntegrationSettings::new(0.0, 10.0, 3.0).unwrap_err(),
            ConfigurationError::UnevenGrid {
                horizon: 10.0,
                output_step: 3.0,
            }
        );
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert!(matches!(
            IntegrationSettings::new(0.0, 1e300, 1e-300),
            Err(ConfigurationError::TooManySteps { steps, .. }) if steps.is_infinite()
        ));
        assert!(matches!(
            IntegrationSettings::new(0.0, 1e12, 1e-6),
            Err(ConfigurationError::TooManySteps { steps, max: MAX_OUTPUT_STEPS })
                if steps > 1e17
        ));
        assert!(matches!(
            IntegrationSettings::new(-1e308, 1e308, 1.0),
            Err(ConfigurationError::TooManySteps { .. })
        ));

        let largest = IntegrationSettings::new(0.0, MAX_OUTPUT_STEPS as f64, 1.0).unwrap();
        assert_eq!(largest.steps(), MAX_OUTPUT_STEPS);
    }

    #[test]
    fn empty_or_backward_horizon_is_rejected() {
        assert!(matches!(
            IntegrationSettings::new(10.0, 10.0, 1.0),
            Err(ConfigurationError::Parameter {
                parameter: "horizon",
                ..
            })
        ));
        assert!(IntegrationSettings::new(10.0, 0.0, 1.0).is_err());
        assert!(IntegrationSettings::new(0.0, 10.0, 0.0).is_err());
        assert!(IntegrationSettings::new(0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn initial_state_is_the_feed() {
        let state = Simulation::reference().initial_state();

        assert_relative_eq!(state.concentration, 8007.46);
        assert_relative_eq!(state.temperature, 294.4);
        assert_relative_eq!(state.jacket_temperature, 294.4);
    }

    #[test]
    fn samples_land_on_the_grid() {
        let settings = IntegrationSettings::new(50.0, 150.0, 10.0).unwrap();
        let simulation = Simulation::new(
            ModelParameters::reference(),
            DisturbanceSchedule::none(),
            settings,
        );

        let trajectory = simulation.run(simulation.initial_state()).unwrap();

        let times: Vec<f64> = trajectory.times().collect();
        assert_eq!(times.len(), 11);
        for (k, time) in times.iter().enumerate() {
            assert_relative_eq!(*time, 50.0 + 10.0 * k as f64, max_relative = 1e-12);
        }
        assert_eq!(trajectory.first().unwrap().state, simulation.initial_state());
    }

    #[test]
    fn observer_can_end_the_run() {
        let settings = IntegrationSettings::new(0.0, 1000.0, 1.0).unwrap();
        let simulation = Simulation::new(
            ModelParameters::reference(),
            DisturbanceSchedule::none(),
            settings,
        );

        let mut seen = 0;
        let trajectory = simulation
            .run_observed(simulation.initial_state(), |sample| {
                seen += 1;
                if sample.time >= 100.0 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(seen, 101);
        assert_eq!(trajectory.len(), 101);
        assert_relative_eq!(trajectory.last().unwrap().time, 100.0);
    }

    #[test]
    fn domain_violation_reports_last_valid_sample() {
        let simulation = Simulation::reference();
        let initial = ReactorState {
            temperature: 0.0,
            ..simulation.initial_state()
        };

        let error = simulation.run(initial).unwrap_err();

        assert!(error.last_valid().is_none());
        assert!(matches!(
            error,
            SimulationError::NumericDomain {
                source: crate::DomainError::ReactorTemperature { .. },
                ..
            }
        ));
    }

    #[test]
    fn substep_budget_exhaustion_is_an_integration_failure() {
        let settings = IntegrationSettings::new(0.0, 100.0, 100.0)
            .unwrap()
            .with_solver(
                Config::new(1e-10, 1e-10)
                    .and_then(|config| config.with_max_step(1.0))
                    .and_then(|config| config.with_max_substeps(5))
                    .unwrap(),
            );
        let simulation = Simulation::new(
            ModelParameters::reference(),
            DisturbanceSchedule::none(),
            settings,
        );

        let error = simulation.run(simulation.initial_state()).unwrap_err();

        assert!(matches!(
            error,
            SimulationError::IntegrationFailure {
                source: dormand_prince::Error::MaxSubstepsExceeded { .. },
                ..
            }
        ));
        assert_eq!(error.last_valid().map(|s| s.time), Some(0.0));
    }

    #[test]
    fn runaway_kinetics_exhaust_the_substep_budget() {
        let parameters = ModelParameters::new(ParameterConfig {
            pre_exponential_factor: Frequency::new::<hertz>(1.0e11),
            ..ParameterConfig::reference()
        })
        .unwrap();
        let settings = IntegrationSettings::new(0.0, 10.0, 1.0).unwrap();
        let simulation = Simulation::new(parameters, DisturbanceSchedule::none(), settings);

        let error = simulation.run(simulation.initial_state()).unwrap_err();

        match error {
            SimulationError::IntegrationFailure {
                last_valid: Some(last_valid),
                source:
                    dormand_prince::Error::MaxSubstepsExceeded {
                        offset,
                        max_substeps,
                        ..
                    },
            } => {
                assert_eq!(max_substeps, Config::default().max_substeps());
                assert!(offset >= last_valid.time && offset < last_valid.time + 1.0);
                assert!(last_valid.time < 10.0);
            }
            other => panic!("expected an exhausted substep budget, got {other}"),
        }
    }
}
