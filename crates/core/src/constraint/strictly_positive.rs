use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError, sign_of};

/// Marker type enforcing that a value is strictly positive (`> 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StrictlyPositive;

impl StrictlyPositive {
    /// Constructs `Constrained<T, StrictlyPositive>` if the value is positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is zero, negative, or NaN.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, StrictlyPositive>, ConstraintError> {
        Constrained::<T, StrictlyPositive>::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for StrictlyPositive {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match sign_of(value)? {
            Ordering::Greater => Ok(()),
            Ordering::Equal => Err(ConstraintError::Zero),
            Ordering::Less => Err(ConstraintError::Negative),
        }
    }
}
