//! [`Command`] for creating a new [`Contract`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Price,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{carrier, contract, Contract},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`] of a carrier.
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// Unique [`contract::Number`] of the new [`Contract`].
    pub number: contract::Number,

    /// ID of the carrier to create the [`Contract`] for.
    pub carrier_id: carrier::Id,

    /// Fuel price locked in by the new [`Contract`].
    pub fuel_price: Price,

    /// Total value of the new [`Contract`].
    pub value: Price,

    /// [`DateTime`] when the new [`Contract`] expires.
    ///
    /// [`Contract::DEFAULT_VALIDITY_YEARS`] from now, if [`None`].
    pub expires_at: Option<contract::ExpirationDateTime>,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Number>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Number>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            number,
            carrier_id,
            fuel_price,
            value,
            expires_at,
        } = cmd;

        if fuel_price.is_zero() {
            return Err(tracerr::new!(E::NonPositiveFuelPrice));
        }

        let now = DateTime::now();
        let expires_at = match expires_at {
            Some(at) => at,
            None => now
                .checked_add_years(Contract::DEFAULT_VALIDITY_YEARS)
                .ok_or(E::InvalidExpiry)
                .map_err(tracerr::wrap!())?
                .coerce(),
        };
        if expires_at <= now.coerce() {
            return Err(tracerr::new!(E::InvalidExpiry));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with another `Contract` of the same `Number`.
        tx.execute(Lock(By::<Contract, _>::new(number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Contract>, _>::new(number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::NumberTaken(number)));
        }

        let contract = Contract {
            id: contract::Id::new(),
            number,
            carrier_id,
            fuel_price,
            value,
            created_at: now.coerce(),
            expires_at,
        };

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Contract(id: {}, number: {})` created for `Carrier(id: {})`",
            contract.id,
            contract.number,
            contract.carrier_id,
        );

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Expiration [`DateTime`] is not in the future.
    #[display("`Contract` must expire in the future")]
    InvalidExpiry,

    /// Fuel price is not positive.
    #[display("Fuel price must be positive")]
    NonPositiveFuelPrice,

    /// [`Contract`] with the provided [`contract::Number`] exists already.
    #[display("`Contract(number: {_0})` exists already")]
    NumberTaken(#[error(not(source))] contract::Number),
}
