//! Operations executed by [`Handler`]s.
//!
//! Storages understand [`Select`], [`Insert`], [`Delete`], [`Lock`],
//! [`Transact`] and [`Commit`], while background tasks understand [`Start`]
//! and [`Perform`].

use std::marker::PhantomData;

use crate::Handler;

/// Stores the value, replacing the stored one with the same identity.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Removes the value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Reads the value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Holds the value exclusively till the end of the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Launches a long-running job.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Runs a single iteration of a job.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Opens a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Handler of an opened [`Transact`]ion.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Commits an opened [`Transact`]ion.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Key `B` addressing `W`.
///
/// `W` only disambiguates operations sharing the same key type, like a
/// [`Lock`] of an order and a [`Lock`] of a truck.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Addressed type.
    _target: PhantomData<W>,

    /// Key itself.
    key: B,
}

impl<W, B> By<W, B> {
    /// Wraps the provided `key`.
    #[must_use]
    pub fn new(key: B) -> Self {
        Self {
            _target: PhantomData,
            key,
        }
    }

    /// Returns a reference to the wrapped key.
    #[must_use]
    pub fn key(&self) -> &B {
        &self.key
    }

    /// Unwraps the key.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.key
    }
}
