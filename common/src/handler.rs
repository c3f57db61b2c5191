//! [`Handler`] abstraction shared by commands, queries, tasks and storages.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// A single type usually implements it many times, once per kind of `Args`
/// it accepts, so the `Args` select the implementation being executed.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Handles the provided `Args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
