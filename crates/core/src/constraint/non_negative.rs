use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError, sign_of};

/// Marker type enforcing that a value is zero or greater (`≥ 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs `Constrained<T, NonNegative>` if the value is non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or NaN.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::<T, NonNegative>::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match sign_of(value)? {
            Ordering::Greater | Ordering::Equal => Ok(()),
            Ordering::Less => Err(ConstraintError::Negative),
        }
    }
}
