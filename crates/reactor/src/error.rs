use cstr_core::constraint::ConstraintError;
use cstr_solvers::transient::dormand_prince;
use thiserror::Error;

use crate::{DomainError, Sample};

/// Errors raised while validating a run before any integration happens.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("`{parameter}` {source}")]
    Parameter {
        parameter: &'static str,
        #[source]
        source: ConstraintError,
    },

    #[error("horizon of {horizon} s is not a whole number of {output_step} s output steps")]
    UnevenGrid { horizon: f64, output_step: f64 },

    #[error("output grid of {steps} steps exceeds the limit of {max} steps")]
    TooManySteps { steps: f64, max: usize },

    #[error("solver settings: {0}")]
    Solver(#[from] dormand_prince::ConfigError),
}

impl ConfigurationError {
    pub(crate) fn parameter(parameter: &'static str, source: ConstraintError) -> Self {
        Self::Parameter { parameter, source }
    }
}

/// Errors that stop a simulation.
///
/// Failures raised during the march carry the last output sample that was
/// fully integrated, or `None` if the run failed before the first one.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error("state left the physical domain: {source}")]
    NumericDomain {
        last_valid: Option<Sample>,
        #[source]
        source: DomainError,
    },

    #[error("integration failed: {source}")]
    IntegrationFailure {
        last_valid: Option<Sample>,
        #[source]
        source: dormand_prince::Error,
    },
}

impl SimulationError {
    /// Classifies a solver failure, separating domain violations of the
    /// reactor model from numerical breakdowns of the solver itself.
    pub(crate) fn from_solver(error: dormand_prince::Error, last_valid: Option<Sample>) -> Self {
        match error {
            dormand_prince::Error::Model { offset, source } => {
                match source.downcast::<DomainError>() {
                    Ok(domain) => Self::NumericDomain {
                        last_valid,
                        source: *domain,
                    },
                    Err(source) => Self::IntegrationFailure {
                        last_valid,
                        source: dormand_prince::Error::Model { offset, source },
                    },
                }
            }
            other => Self::IntegrationFailure {
                last_valid,
                source: other,
            },
        }
    }

    /// Returns the last fully integrated sample, if the march had produced one.
    #[must_use]
    pub fn last_valid(&self) -> Option<&Sample> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::NumericDomain { last_valid, .. } | Self::IntegrationFailure { last_valid, .. } => {
                last_valid.as_ref()
            }
        }
    }
}
