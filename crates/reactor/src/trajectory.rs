use std::slice;

use crate::{InvalidInput, ReactorState};

/// The reactor state at one output time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time in seconds.
    pub time: f64,
    pub state: ReactorState,
}

/// States sampled at strictly increasing times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    /// Creates a trajectory from samples.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::TimeNotIncreasing`] if any sample time is not
    /// finite or does not come strictly after the previous one.
    pub fn new(samples: Vec<Sample>) -> Result<Self, InvalidInput> {
        let mut previous = f64::NEG_INFINITY;
        for (index, sample) in samples.iter().enumerate() {
            if !(sample.time.is_finite() && sample.time > previous) {
                return Err(InvalidInput::TimeNotIncreasing {
                    index,
                    time: sample.time,
                });
            }
            previous = sample.time;
        }
        Ok(Self { samples })
    }

    /// Wraps samples already known to be in strictly increasing time order.
    pub(crate) fn from_ordered(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Returns the sample times.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.time)
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
