/// Control actions supported by the Dormand–Prince solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver at the current output point and return the solution so far.
    StopEarly,
}
