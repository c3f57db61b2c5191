//! [`Command`] for creating a new [`Order`].

use common::{
    operations::{By, Insert, Select},
    DateTime, Price,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        carrier, company, contract, destination,
        order::{self, Event, LoadingWindow},
        Contract, Destination, Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Order`] for a carrier, usually the one
/// named by the [`ResolveBestCarrier`] query.
///
/// [`ResolveBestCarrier`]: crate::query::ResolveBestCarrier
#[derive(Clone, Copy, Debug)]
pub struct CreateOrder {
    /// ID of the company requesting the [`Order`].
    pub company_id: company::Id,

    /// ID of the carrier to assign the [`Order`] to.
    pub carrier_id: carrier::Id,

    /// ID of the [`Destination`] to deliver to.
    pub destination_id: destination::Id,

    /// [`DateTime`] when loading starts.
    pub loading_starts_at: order::LoadingDateTime,

    /// [`DateTime`] when loading ends.
    pub loading_ends_at: order::LoadingDateTime,

    /// Fuel price to lock in the [`Order`].
    pub fuel_price: Price,
}

impl<Db> Command<CreateOrder> for Service<Db>
where
    Db: Database<
            Select<By<Option<Destination>, destination::Id>>,
            Ok = Option<Destination>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrder {
            company_id,
            carrier_id,
            destination_id,
            loading_starts_at,
            loading_ends_at,
            fuel_price,
        } = cmd;

        let window = LoadingWindow::new(loading_starts_at, loading_ends_at)
            .ok_or(E::InvalidLoadingWindow)
            .map_err(tracerr::wrap!())?;
        if loading_starts_at < DateTime::now().coerce() {
            return Err(tracerr::new!(E::LoadingInPast(loading_starts_at)));
        }
        if fuel_price.is_zero() {
            return Err(tracerr::new!(E::NonPositiveFuelPrice));
        }

        let destination = self
            .database()
            .execute(Select(By::<Option<Destination>, _>::new(destination_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DestinationNotExists(destination_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(
                destination.contract_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| c.carrier_id == carrier_id && c.is_active())
            .ok_or(E::DestinationNotServed {
                destination_id,
                carrier_id,
            })
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let order = Order::new(
            company_id,
            carrier_id,
            destination_id,
            window,
            fuel_price,
        );

        self.database()
            .execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Order(id: {})` created for `Carrier(id: {carrier_id})`",
            order.id,
        );
        self.publish(Event::Created {
            id: order.id,
            carrier_id,
        });

        Ok(order)
    }
}

/// Error of [`CreateOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Destination`] is not served by the carrier under an active
    /// [`Contract`].
    #[display(
        "`Destination(id: {destination_id})` is not served by \
         `Carrier(id: {carrier_id})`"
    )]
    DestinationNotServed {
        /// ID of the [`Destination`].
        destination_id: destination::Id,

        /// ID of the carrier.
        carrier_id: carrier::Id,
    },

    /// [`Destination`] with the provided ID does not exist.
    #[display("`Destination(id: {_0})` does not exist")]
    DestinationNotExists(#[error(not(source))] destination::Id),

    /// Loading window doesn't start strictly before it ends.
    #[display("Loading window must start before it ends")]
    InvalidLoadingWindow,

    /// Loading window starts in the past.
    #[display("Loading window starts in the past: {}", _0.to_rfc3339())]
    LoadingInPast(#[error(not(source))] order::LoadingDateTime),

    /// Fuel price is not positive.
    #[display("Fuel price must be positive")]
    NonPositiveFuelPrice,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Insert, DateTime, Price};

    use crate::{
        domain::{company, order::Status, Contract, Destination},
        fixtures::{self, DAY},
        infra::{Database as _, Memory},
        Command as _, Service,
    };

    use super::{CreateOrder, ExecutionError as E};

    async fn seed(svc: &Service<Memory>) -> (Contract, Destination) {
        let contract = fixtures::contract("C-1");
        let destination = fixtures::destination(&contract, "Rotterdam");
        svc.database().execute(Insert(contract.clone())).await.unwrap();
        svc.database()
            .execute(Insert(destination.clone()))
            .await
            .unwrap();
        (contract, destination)
    }

    fn create(contract: &Contract, destination: &Destination) -> CreateOrder {
        let now = DateTime::now();
        CreateOrder {
            company_id: company::Id::new(),
            carrier_id: contract.carrier_id,
            destination_id: destination.id,
            loading_starts_at: (now + DAY).coerce(),
            loading_ends_at: (now + 2 * DAY).coerce(),
            fuel_price: fixtures::price("1.60"),
        }
    }

    #[tokio::test]
    async fn creates_pending_order() {
        let svc = fixtures::service();
        let (contract, destination) = seed(&svc).await;
        let mut events = svc.subscribe();

        let order = svc
            .execute(create(&contract, &destination))
            .await
            .unwrap();

        assert_eq!(order.status(), Status::Pending);
        assert_eq!(order.carrier_id, contract.carrier_id);
        assert!(order.plate().is_none());
        assert!(order.truck_submitted_at().is_none());
        assert!(events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn validates_input() {
        let svc = fixtures::service();
        let (contract, destination) = seed(&svc).await;

        let mut cmd = create(&contract, &destination);
        cmd.loading_ends_at = cmd.loading_starts_at;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::InvalidLoadingWindow), "{err}");

        let mut cmd = create(&contract, &destination);
        cmd.loading_starts_at =
            (DateTime::now() - Duration::from_secs(60)).coerce();
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::LoadingInPast(_)), "{err}");

        let mut cmd = create(&contract, &destination);
        cmd.fuel_price = Price::ZERO;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::NonPositiveFuelPrice), "{err}");
    }

    #[tokio::test]
    async fn requires_serving_carrier() {
        let svc = fixtures::service();
        let (contract, destination) = seed(&svc).await;

        let mut cmd = create(&contract, &destination);
        cmd.carrier_id = fixtures::contract("C-2").carrier_id;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::DestinationNotServed { .. }));

        let mut cmd = create(&contract, &destination);
        cmd.destination_id = fixtures::destination(&contract, "Hamburg").id;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), E::DestinationNotExists(_)));
    }

    #[tokio::test]
    async fn requires_active_contract() {
        let svc = fixtures::service();
        let (mut contract, destination) = seed(&svc).await;
        contract.expires_at = (DateTime::now() - DAY).coerce();
        svc.database().execute(Insert(contract.clone())).await.unwrap();

        let err = svc
            .execute(create(&contract, &destination))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::DestinationNotServed { .. }));
    }
}
