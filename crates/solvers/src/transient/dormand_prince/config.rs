use thiserror::Error;

/// Configuration for the Dormand–Prince solver.
///
/// The local error of each internal step is measured against
/// `atol + rtol * |y|` per component, so `rtol` governs large components and
/// `atol` keeps components near zero from demanding unbounded accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    rtol: f64,
    atol: f64,
    initial_step: Option<f64>,
    min_step: f64,
    max_step: f64,
    max_substeps: usize,
}

/// Errors that can occur when validating a Dormand–Prince solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rtol must be finite and positive")]
    Rtol,

    #[error("atol must be finite and positive")]
    Atol,

    #[error("initial_step must be finite and positive")]
    InitialStep,

    #[error("min_step must be finite and positive")]
    MinStep,

    #[error("max_step must be positive and at least min_step")]
    MaxStep,

    #[error("max_substeps must be at least one")]
    MaxSubsteps,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-6,
            initial_step: None,
            min_step: 1e-10,
            max_step: f64::INFINITY,
            max_substeps: 500,
        }
    }
}

fn finite_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl Config {
    /// Creates a new config with the given tolerances and default step limits.
    ///
    /// # Errors
    ///
    /// Returns an error if either tolerance is non-positive or non-finite.
    pub fn new(rtol: f64, atol: f64) -> Result<Self, ConfigError> {
        if !finite_positive(rtol) {
            return Err(ConfigError::Rtol);
        }
        if !finite_positive(atol) {
            return Err(ConfigError::Atol);
        }

        Ok(Self {
            rtol,
            atol,
            ..Self::default()
        })
    }

    /// Sets the first internal step size instead of estimating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is non-positive or non-finite.
    pub fn with_initial_step(self, step: f64) -> Result<Self, ConfigError> {
        if !finite_positive(step) {
            return Err(ConfigError::InitialStep);
        }
        Ok(Self {
            initial_step: Some(step),
            ..self
        })
    }

    /// Sets the smallest internal step the controller may propose.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is non-positive, non-finite, or above `max_step`.
    pub fn with_min_step(self, step: f64) -> Result<Self, ConfigError> {
        if !finite_positive(step) {
            return Err(ConfigError::MinStep);
        }
        if step > self.max_step {
            return Err(ConfigError::MaxStep);
        }
        Ok(Self {
            min_step: step,
            ..self
        })
    }

    /// Sets the largest internal step the controller may propose.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is NaN, non-positive, or below `min_step`.
    pub fn with_max_step(self, step: f64) -> Result<Self, ConfigError> {
        if step.is_nan() || step <= 0.0 || step < self.min_step {
            return Err(ConfigError::MaxStep);
        }
        Ok(Self {
            max_step: step,
            ..self
        })
    }

    /// Sets the internal step budget for each output interval.
    ///
    /// Both accepted and rejected attempts count against the budget.
    ///
    /// The method is explicit, so its stable step shrinks with the fastest
    /// timescale of the system. Stiff stretches such as a thermal runaway can
    /// exhaust the default budget of 500 and end the run with
    /// [`Error::MaxSubstepsExceeded`](super::Error::MaxSubstepsExceeded).
    /// The reference reactor integrates cleanly up to a pre-exponential factor
    /// of `1e10` 1/s but fails about 1.4 s in at `1e11` 1/s.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_substeps` is zero.
    pub fn with_max_substeps(self, max_substeps: usize) -> Result<Self, ConfigError> {
        if max_substeps == 0 {
            return Err(ConfigError::MaxSubsteps);
        }
        Ok(Self {
            max_substeps,
            ..self
        })
    }

    /// Returns the relative tolerance.
    #[must_use]
    pub fn rtol(&self) -> f64 {
        self.rtol
    }

    /// Returns the absolute tolerance.
    #[must_use]
    pub fn atol(&self) -> f64 {
        self.atol
    }

    /// Returns the configured initial step, if any.
    #[must_use]
    pub fn initial_step(&self) -> Option<f64> {
        self.initial_step
    }

    /// Returns the minimum internal step size.
    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.min_step
    }

    /// Returns the maximum internal step size.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Returns the internal step budget per output interval.
    #[must_use]
    pub fn max_substeps(&self) -> usize {
        self.max_substeps
    }
}
