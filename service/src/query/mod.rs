//! [`Query`] definitions.
//!
//! Plain key lookups are [`Lookup`] aliases, while queries applying business
//! rules have their own types.

pub mod contract;
pub mod destination;
pub mod fuel_price;
pub mod order;
pub mod resolve_best_carrier;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

pub use self::{
    fuel_price::CurrentFuelPrice, resolve_best_carrier::ResolveBestCarrier,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] looking a `W` up by a `B` key straight in the [`Database`],
/// with no business rules applied on top.
#[derive(Clone, Copy, Debug)]
pub struct Lookup<T>(T);

impl<W, B> Lookup<By<W, B>> {
    /// Creates a new [`Lookup`] of a `W` by the provided `key`.
    #[must_use]
    pub fn by(key: B) -> Self {
        Self(By::new(key))
    }
}

impl<Db, W, B> Query<Lookup<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lookup(key): Lookup<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(key))
            .await
            .map_err(tracerr::wrap!())
    }
}
