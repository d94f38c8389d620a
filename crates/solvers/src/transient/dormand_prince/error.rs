use std::error::Error as StdError;

/// Errors that can occur during Dormand–Prince integration.
///
/// Every variant raised during the march records the `offset` (distance in the
/// independent variable from the initial input) at which the solver stopped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("output step must be finite and positive, got {0}")]
    InvalidOutputStep(f64),

    #[error("model error at offset {offset}: {source}")]
    Model {
        offset: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("problem error at offset {offset}: {source}")]
    Problem {
        offset: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("step size {step:e} fell below the minimum at offset {offset}")]
    StepSizeUnderflow { offset: f64, step: f64 },

    #[error("exceeded {max_substeps} internal steps at offset {offset} before reaching {target}")]
    MaxSubstepsExceeded {
        offset: f64,
        target: f64,
        max_substeps: usize,
    },
}

impl Error {
    pub(crate) fn model<E: StdError + Send + Sync + 'static>(offset: f64, err: E) -> Self {
        Self::Model {
            offset,
            source: Box::new(err),
        }
    }

    pub(crate) fn problem<E: StdError + Send + Sync + 'static>(offset: f64, err: E) -> Self {
        Self::Problem {
            offset,
            source: Box::new(err),
        }
    }

    /// Returns the offset at which integration failed, if the march had started.
    #[must_use]
    pub fn offset(&self) -> Option<f64> {
        match self {
            Self::InvalidOutputStep(_) => None,
            Self::Model { offset, .. }
            | Self::Problem { offset, .. }
            | Self::StepSizeUnderflow { offset, .. }
            | Self::MaxSubstepsExceeded { offset, .. } => Some(*offset),
        }
    }
}
