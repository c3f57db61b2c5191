//! [`ResolveBestCarrier`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        destination,
        fuel_price::{EffectiveDate, Record},
        pricing::{self, Candidate, Offer},
    },
    infra::{database, Database},
    query::fuel_price::{self, CurrentFuelPrice},
    read::contract::Active,
    Query, Service,
};
#[cfg(doc)]
use crate::domain::{Contract, Destination};

/// [`Query`] resolving the carrier offering the best price of delivering to
/// a [`destination::City`].
///
/// Only [`Destination`]s served under active [`Contract`]s are considered.
/// [`None`] is returned if there are no such [`Destination`]s, so the
/// [`destination::City`] cannot be served at the moment.
///
/// See [`pricing::best_offer()`] for how the best [`Offer`] is chosen.
#[derive(Clone, Debug)]
pub struct ResolveBestCarrier {
    /// [`destination::City`] to deliver to.
    pub city: destination::City,
}

impl<Db> Query<ResolveBestCarrier> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Active<Candidate>>, destination::City>>,
            Ok = Vec<Active<Candidate>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Record>, EffectiveDate>>,
            Ok = Option<Record>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Offer>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ResolveBestCarrier { city }: ResolveBestCarrier,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let candidates = self
            .database()
            .execute(Select(By::<Vec<Active<Candidate>>, _>::new(city.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if candidates.is_empty() {
            log::debug!("No active `Contract` serves `{city}`");
            return Ok(None);
        }

        let current = self
            .execute(CurrentFuelPrice)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let offer = pricing::best_offer(
            candidates.into_iter().map(Active::into_inner),
            current.price,
            DateTime::now(),
        );
        if let Some(o) = &offer {
            log::debug!(
                "`Carrier(id: {})` offers {} for `{city}` under \
                 `Contract(id: {})`",
                o.carrier_id,
                o.price,
                o.contract_id,
            );
        }

        Ok(offer)
    }
}

/// Error of [`ResolveBestCarrier`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No fuel price is recorded on or before today.
    #[display("No fuel price is recorded yet")]
    NoFuelPrice,
}

impl From<fuel_price::ExecutionError> for ExecutionError {
    fn from(e: fuel_price::ExecutionError) -> Self {
        use fuel_price::ExecutionError as E;

        match e {
            E::Db(e) => Self::Db(e),
            E::NoFuelPrice => Self::NoFuelPrice,
        }
    }
}
