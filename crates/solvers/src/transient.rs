//! Solvers that march an [`OdeProblem`] forward in its independent variable.
//!
//! [`OdeProblem`]: cstr_core::OdeProblem

pub mod dormand_prince;
