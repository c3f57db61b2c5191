//! [`Contract`] read model definition.

#[cfg(doc)]
use crate::domain::Contract;

/// Wrapper around an entity indicating that its [`Contract`] is active.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Active<T>(pub T);

impl<T> Active<T> {
    /// Unwraps this [`Active`] entity.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}
