//! [`Command`] for creating a new [`Destination`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Price,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, destination, Contract, Destination},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Destination`] served under a
/// [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateDestination {
    /// ID of the [`Contract`] to serve the [`Destination`] under.
    pub contract_id: contract::Id,

    /// [`destination::City`] to deliver to.
    pub city: destination::City,

    /// [`destination::Country`] of the [`destination::City`].
    pub country: destination::Country,

    /// Negotiated price of delivering to the [`Destination`].
    pub base_price: Price,
}

impl<Db> Command<CreateDestination> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Destination, (contract::Id, destination::City)>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<Option<Destination>, (contract::Id, destination::City)>,
            >,
            Ok = Option<Destination>,
            Err = Traced<database::Error>,
        > + Database<Insert<Destination>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Destination;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateDestination,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateDestination {
            contract_id,
            city,
            country,
            base_price,
        } = cmd;

        let contract = self
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

        let key = (contract_id, city.clone());
        tx.execute(Lock(By::<Destination, _>::new(key.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Destination>, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::DestinationExists {
                contract_id,
                city,
            }));
        }

        let destination = Destination {
            id: destination::Id::new(),
            contract_id,
            city,
            country,
            base_price,
            contract_fuel_price: contract.fuel_price,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(destination.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Destination(id: {}, city: {})` created for \
             `Contract(id: {contract_id})`",
            destination.id,
            destination.city,
        );

        Ok(destination)
    }
}

/// Error of [`CreateDestination`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] serves the [`destination::City`] already.
    #[display("`Contract(id: {contract_id})` serves `{city}` already")]
    DestinationExists {
        /// ID of the [`Contract`].
        contract_id: contract::Id,

        /// Already served [`destination::City`].
        city: destination::City,
    },
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{contract, destination},
        fixtures,
        infra::Database as _,
        Command as _,
    };

    use super::{CreateDestination, ExecutionError as E};

    fn create(contract_id: contract::Id, city: &str) -> CreateDestination {
        CreateDestination {
            contract_id,
            city: destination::City::new(city).unwrap(),
            country: destination::Country::new("DE").unwrap(),
            base_price: fixtures::price("220"),
        }
    }

    #[tokio::test]
    async fn copies_contract_fuel_price() {
        let svc = fixtures::service();
        let contract = fixtures::contract("C-1");
        svc.database().execute(Insert(contract.clone())).await.unwrap();

        let destination =
            svc.execute(create(contract.id, "Hamburg")).await.unwrap();

        assert_eq!(destination.contract_id, contract.id);
        assert_eq!(destination.contract_fuel_price, contract.fuel_price);
        assert_eq!(destination.base_price, fixtures::price("220"));
    }

    #[tokio::test]
    async fn allows_one_city_per_contract() {
        let svc = fixtures::service();
        let contract = fixtures::contract("C-1");
        let other = fixtures::contract("C-2");
        svc.database().execute(Insert(contract.clone())).await.unwrap();
        svc.database().execute(Insert(other.clone())).await.unwrap();

        svc.execute(create(contract.id, "Hamburg")).await.unwrap();
        svc.execute(create(other.id, "Hamburg")).await.unwrap();
        let err = svc
            .execute(create(contract.id, "Hamburg"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::DestinationExists { .. }), "{err}");
    }

    #[tokio::test]
    async fn requires_existing_contract() {
        let svc = fixtures::service();

        let err = svc
            .execute(create(contract::Id::new(), "Hamburg"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::ContractNotExists(_)), "{err}");
    }
}
