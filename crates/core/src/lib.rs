//! Core traits and types for the cstr workspace.
//!
//! This crate defines the shared abstractions that solvers and models build on:
//!
//! - [`Model`]: a callable that maps a typed input to a typed output
//! - [`Snapshot`]: a captured input/output pair from a model call
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`OdeProblem`]: adapts a model to a state that an ODE solver can step
//! - [`StepIntegrable`]: a state that can be advanced by its derivative
//! - [`constraint`]: numeric invariants checked once at construction

pub mod constraint;
mod model;
mod observer;
mod problems;
mod step;

pub use observer::Observer;
pub use problems::OdeProblem;
pub use step::{DerivativeOf, StepIntegrable};
pub use model::{Model, Snapshot};
