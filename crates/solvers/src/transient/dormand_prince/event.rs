use cstr_core::Snapshot;

/// Event emitted by the Dormand–Prince solver at each output point.
///
/// Step 0 is the initial state before any integration.
/// Steps 1..N are emitted once the solver lands on each output point.
#[derive(Debug, Clone)]
pub struct Event<I, O> {
    /// The output point number (0 for initial, 1..N for grid points).
    pub step: usize,

    /// Snapshot of the model input and output at this output point.
    pub snapshot: Snapshot<I, O>,

    /// Number of accepted internal steps taken to reach this point.
    pub substeps: usize,

    /// Size of the last accepted internal step (zero for the initial event).
    pub step_size: f64,
}
