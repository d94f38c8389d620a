//! Numerical solvers for the cstr workspace.
//!
//! Solvers are generic over [`cstr_core::Model`] and the problem traits in
//! `cstr-core`, and report progress through [`cstr_core::Observer`].
//!
//! - [`transient::dormand_prince`]: adaptive Dormand–Prince 5(4) integration
//!   sampled on a uniform output grid

pub mod transient;
