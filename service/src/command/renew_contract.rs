//! [`Command`] for renewing a [`Contract`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, Contract},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for renewing a [`Contract`].
///
/// Renewal never touches the existing [`Contract`]: a new one is created for
/// the same carrier and on the same terms, numbered as the next renewal of
/// the existing one.
#[derive(Clone, Copy, Debug)]
pub struct RenewContract {
    /// ID of the [`Contract`] to renew.
    pub contract_id: contract::Id,

    /// Number of years the new [`Contract`] is valid for.
    pub years: u16,
}

impl<Db> Command<RenewContract> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::RenewalPrefix>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<contract::Number>, contract::RenewalPrefix>>,
            Ok = Vec<contract::Number>,
            Err = Traced<database::Error>,
        > + Database<
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

    async fn execute(&self, cmd: RenewContract) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RenewContract { contract_id, years } = cmd;

        let now = DateTime::now();
        let expires_at = (years > 0)
            .then(|| now.checked_add_years(years))
            .flatten()
            .ok_or(E::InvalidPeriod(years))
            .map_err(tracerr::wrap!())?;

        let previous = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize renewals sharing the same numbering sequence.
        let prefix = previous.number.renewal_prefix();
        tx.execute(Lock(By::<Contract, _>::new(prefix.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Vec<contract::Number>, _>::new(
                prefix.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let number = prefix.successor(&existing);

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

        let renewed = Contract {
            id: contract::Id::new(),
            number,
            created_at: now.coerce(),
            expires_at: expires_at.coerce(),
            ..previous
        };

        tx.execute(Insert(renewed.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Contract(id: {contract_id})` renewed as \
             `Contract(id: {}, number: {})` for {years} year(s)",
            renewed.id,
            renewed.number,
        );

        Ok(renewed)
    }
}

/// Error of [`RenewContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Renewal period is zero or too long.
    #[display("Invalid renewal period: {_0} year(s)")]
    InvalidPeriod(#[error(not(source))] u16),

    /// Renewal [`contract::Number`] is occupied by an unrelated [`Contract`].
    #[display("`Contract(number: {_0})` exists already")]
    NumberTaken(#[error(not(source))] contract::Number),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::contract,
        fixtures,
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError as E, RenewContract};

    #[tokio::test]
    async fn numbers_renewals_sequentially() {
        let svc = fixtures::service();
        let original = fixtures::contract("FR2024");
        svc.database().execute(Insert(original.clone())).await.unwrap();

        let first = svc
            .execute(RenewContract {
                contract_id: original.id,
                years: 1,
            })
            .await
            .unwrap();
        let second = svc
            .execute(RenewContract {
                contract_id: first.id,
                years: 2,
            })
            .await
            .unwrap();

        assert_eq!(first.number.to_string(), "FR2024-R01");
        assert_eq!(second.number.to_string(), "FR2024-R02");
        assert_eq!(second.carrier_id, original.carrier_id);
        assert_eq!(second.fuel_price, original.fuel_price);
        assert_eq!(second.value, original.value);
        assert_eq!(
            second.expires_at,
            second.created_at.checked_add_years(2).unwrap().coerce(),
        );
    }

    #[tokio::test]
    async fn keeps_renewed_contract_intact() {
        let svc = fixtures::service();
        let original = fixtures::contract("FR2024");
        svc.database().execute(Insert(original.clone())).await.unwrap();

        svc.execute(RenewContract {
            contract_id: original.id,
            years: 1,
        })
        .await
        .unwrap();

        let stored = svc
            .execute(crate::query::contract::ById::by(original.id))
            .await
            .unwrap();
        assert_eq!(stored, Some(original));
    }

    #[tokio::test]
    async fn rejects_zero_period() {
        let svc = fixtures::service();
        let original = fixtures::contract("FR2024");
        svc.database().execute(Insert(original.clone())).await.unwrap();

        let err = svc
            .execute(RenewContract {
                contract_id: original.id,
                years: 0,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::InvalidPeriod(0)), "{err}");
    }

    #[tokio::test]
    async fn requires_existing_contract() {
        let svc = fixtures::service();

        let err = svc
            .execute(RenewContract {
                contract_id: contract::Id::new(),
                years: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::ContractNotExists(_)), "{err}");
    }
}
