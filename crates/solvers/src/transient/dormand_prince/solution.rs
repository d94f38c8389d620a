use cstr_core::Snapshot;

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the final output point.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// Counters describing the work done by the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Internal steps whose error estimate met the tolerances.
    pub accepted: usize,

    /// Internal steps that were retried with a smaller step size.
    pub rejected: usize,

    /// Total number of model calls.
    pub evaluations: usize,
}

/// The result of a Dormand–Prince integration.
#[derive(Debug, Clone)]
pub struct Solution<I, O> {
    /// How the solver terminated.
    pub status: Status,

    /// Snapshots at each output point, starting with the initial state.
    pub history: Vec<Snapshot<I, O>>,

    /// Number of output intervals completed.
    pub steps: usize,

    /// Internal step and evaluation counters.
    pub stats: Stats,
}
