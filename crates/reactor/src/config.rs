use cstr_solvers::transient::dormand_prince::Config;
use serde::{Deserialize, Serialize};
use uom::si::{f64::ThermodynamicTemperature, thermodynamic_temperature::kelvin};

use crate::{
    ConfigurationError, DisturbanceSchedule, IntegrationSettings, ModelParameters,
    ParameterConfig, ReactorState, Simulation,
};

/// Complete description of a run, as read from a configuration file.
///
/// Only `parameters` is required. Omitted sections fall back to the reference
/// run, and an omitted `initial` state starts the reactor at feed conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub parameters: ParameterConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<ReactorState>,

    #[serde(default)]
    pub disturbance: DisturbanceConfig,

    #[serde(default)]
    pub integration: IntegrationConfig,
}

/// Step disturbance applied partway through a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisturbanceConfig {
    /// Whether the disturbance is applied at all.
    pub enabled: bool,

    /// Switch time in seconds; halfway through the horizon when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_time: Option<f64>,

    /// Feed temperature after the switch in kelvin.
    pub feed_temperature: f64,

    /// Multiplier on the nominal coolant flow after the switch.
    pub coolant_flow_factor: f64,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            switch_time: None,
            feed_temperature: DisturbanceSchedule::REFERENCE_FEED_TEMPERATURE,
            coolant_flow_factor: DisturbanceSchedule::REFERENCE_COOLANT_FLOW_FACTOR,
        }
    }
}

impl DisturbanceConfig {
    /// Builds the schedule for a run over `settings`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the disturbance values are invalid.
    pub fn schedule(
        &self,
        settings: &IntegrationSettings,
    ) -> Result<DisturbanceSchedule, ConfigurationError> {
        if !self.enabled {
            return Ok(DisturbanceSchedule::none());
        }

        let midpoint = DisturbanceSchedule::at_midpoint(settings.start_time(), settings.end_time());
        DisturbanceSchedule::new(
            self.switch_time.unwrap_or(midpoint.switch_time()),
            ThermodynamicTemperature::new::<kelvin>(self.feed_temperature),
            self.coolant_flow_factor,
        )
    }
}

/// Output grid and solver tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Start time in seconds.
    pub start_time: f64,

    /// End time in seconds.
    pub end_time: f64,

    /// Spacing of output samples in seconds.
    pub output_step: f64,

    /// Relative error tolerance per internal step.
    pub rtol: f64,

    /// Absolute error tolerance per internal step.
    pub atol: f64,

    /// Largest internal step in seconds; unbounded when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_step: Option<f64>,

    /// Most internal step attempts allowed between two output samples.
    pub max_substeps: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        let settings = IntegrationSettings::reference();
        let solver = settings.solver();
        Self {
            start_time: settings.start_time(),
            end_time: settings.end_time(),
            output_step: settings.output_step(),
            rtol: solver.rtol(),
            atol: solver.atol(),
            max_step: None,
            max_substeps: solver.max_substeps(),
        }
    }
}

impl IntegrationConfig {
    /// Validates the grid and solver tolerances.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the grid or the solver settings are
    /// invalid.
    pub fn settings(&self) -> Result<IntegrationSettings, ConfigurationError> {
        let mut solver =
            Config::new(self.rtol, self.atol)?.with_max_substeps(self.max_substeps)?;
        if let Some(max_step) = self.max_step {
            solver = solver.with_max_step(max_step)?;
        }

        Ok(IntegrationSettings::new(self.start_time, self.end_time, self.output_step)?
            .with_solver(solver))
    }
}

impl RunConfig {
    /// Returns the reference run configuration.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            parameters: ParameterConfig::reference(),
            initial: None,
            disturbance: DisturbanceConfig::default(),
            integration: IntegrationConfig::default(),
        }
    }

    /// Validates the configuration and assembles the simulation.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn build(&self) -> Result<Simulation, ConfigurationError> {
        let parameters = ModelParameters::new(self.parameters)?;
        let settings = self.integration.settings()?;
        let schedule = self.disturbance.schedule(&settings)?;

        Ok(Simulation::new(parameters, schedule, settings))
    }

    /// Returns the configured initial state, or the feed state of `simulation`.
    #[must_use]
    pub fn initial_state(&self, simulation: &Simulation) -> ReactorState {
        self.initial.unwrap_or_else(|| simulation.initial_state())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use cstr_solvers::transient::dormand_prince::ConfigError;

    #[test]
    fn reference_builds_the_reference_simulation() {
        let simulation = RunConfig::reference().build().unwrap();
        assert_eq!(simulation, Simulation::reference());
    }

    #[test]
    fn switch_defaults_to_midpoint_of_the_horizon() {
        let config = RunConfig {
            integration: IntegrationConfig {
                start_time: 0.0,
                end_time: 7200.0,
                output_step: 60.0,
                ..IntegrationConfig::default()
            },
            ..RunConfig::reference()
        };

        let simulation = config.build().unwrap();

        assert_relative_eq!(simulation.model().schedule().switch_time(), 3600.0);
        assert_eq!(simulation.settings().steps(), 120);
    }

    #[test]
    fn disabled_disturbance_never_switches() {
        let config = RunConfig {
            disturbance: DisturbanceConfig {
                enabled: false,
                switch_time: Some(10.0),
                ..DisturbanceConfig::default()
            },
            ..RunConfig::reference()
        };

        let simulation = config.build().unwrap();

        assert_eq!(*simulation.model().schedule(), DisturbanceSchedule::none());
    }

    #[test]
    fn invalid_tolerance_is_a_configuration_error() {
        let config = RunConfig {
            integration: IntegrationConfig {
                rtol: -1.0,
                ..IntegrationConfig::default()
            },
            ..RunConfig::reference()
        };

        assert_eq!(
            config.build().unwrap_err(),
            ConfigurationError::Solver(ConfigError::Rtol)
        );
    }

    #[test]
    fn explicit_initial_state_is_used() {
        let state = ReactorState {
            concentration: 100.0,
            temperature: 300.0,
            jacket_temperature: 295.0,
        };
        let config = RunConfig {
            initial: Some(state),
            ..RunConfig::reference()
        };

        let simulation = config.build().unwrap();

        assert_eq!(config.initial_state(&simulation), state);
        assert_eq!(
            RunConfig::reference().initial_state(&simulation),
            simulation.initial_state()
        );
    }
}
