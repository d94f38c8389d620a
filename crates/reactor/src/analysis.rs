//! Post-processing of simulated trajectories.
//!
//! The fractional conversion of species A at a sample is
//!
//! ```text
//! X = 1 - cA / cA0
//! ```
//!
//! where `cA0` is the feed concentration. Conversion is zero when the reactor
//! holds unreacted feed and approaches one as A is consumed.

use std::fmt;

use thiserror::Error;

use crate::{Sample, Trajectory};

/// Errors raised when analysis receives data it cannot interpret.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidInput {
    #[error("trajectory has no samples")]
    EmptyTrajectory,

    #[error("sample {index} at t = {time} s does not come strictly after the previous sample")]
    TimeNotIncreasing { index: usize, time: f64 },

    #[error("feed concentration must be finite and positive, got {0} mol/m³")]
    FeedConcentration(f64),
}

/// Returns the fractional conversion for a concentration and feed concentration.
#[must_use]
pub fn conversion(concentration: f64, feed_concentration: f64) -> f64 {
    1.0 - concentration / feed_concentration
}

/// Lazy per-sample conversion view over a trajectory.
///
/// The view borrows the trajectory and can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    samples: &'a [Sample],
    feed_concentration: f64,
}

impl<'a> Conversion<'a> {
    /// Creates a conversion view of `trajectory`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] if the trajectory is empty or the feed
    /// concentration is not finite and positive.
    pub fn new(trajectory: &'a Trajectory, feed_concentration: f64) -> Result<Self, InvalidInput> {
        if !(feed_concentration.is_finite() && feed_concentration > 0.0) {
            return Err(InvalidInput::FeedConcentration(feed_concentration));
        }
        if trajectory.is_empty() {
            return Err(InvalidInput::EmptyTrajectory);
        }

        Ok(Self {
            samples: trajectory.samples(),
            feed_concentration,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the conversion at sample `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.samples
            .get(index)
            .map(|sample| conversion(sample.state.concentration, self.feed_concentration))
    }

    /// Returns the conversion at the last sample.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Iterates over `(time, conversion)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + 'a {
        let feed_concentration = self.feed_concentration;
        self.samples.iter().map(move |sample| {
            (
                sample.time,
                conversion(sample.state.concentration, feed_concentration),
            )
        })
    }
}

/// Headline figures of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Time of the last sample in seconds.
    pub final_time: f64,

    /// Concentration of A at the last sample in mol/m³.
    pub final_concentration: f64,

    /// Fractional conversion at the last sample.
    pub final_conversion: f64,

    /// Highest reactor temperature over the run in kelvin.
    pub peak_temperature: f64,

    /// Time at which the peak temperature was first reached.
    pub peak_temperature_time: f64,
}

impl Summary {
    /// Summarizes a trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] under the same conditions as [`Conversion::new`].
    pub fn new(trajectory: &Trajectory, feed_concentration: f64) -> Result<Self, InvalidInput> {
        let conversion = Conversion::new(trajectory, feed_concentration)?;
        let last = trajectory.last().ok_or(InvalidInput::EmptyTrajectory)?;
        let final_conversion = conversion.last().ok_or(InvalidInput::EmptyTrajectory)?;

        let peak = trajectory
            .iter()
            .fold(last, |peak, sample| {
                if sample.state.temperature > peak.state.temperature
                    || (sample.state.temperature == peak.state.temperature
                        && sample.time < peak.time)
                {
                    sample
                } else {
                    peak
                }
            });

        Ok(Self {
            final_time: last.time,
            final_concentration: last.state.concentration,
            final_conversion,
            peak_temperature: peak.state.temperature,
            peak_temperature_time: peak.time,
        })
    }

    /// Returns the final conversion as a percentage.
    #[must_use]
    pub fn conversion_percent(&self) -> f64 {
        100.0 * self.final_conversion
    }

    /// Returns the final conversion percentage rounded to `decimals` places.
    #[must_use]
    pub fn rounded_conversion_percent(&self, decimals: i32) -> f64 {
        let scale = 10f64.powi(decimals);
        (self.conversion_percent() * scale).round() / scale
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final concentration = {}", self.final_concentration)?;
        write!(f, "Conversion = {} %", self.rounded_conversion_percent(2))
    }
}
