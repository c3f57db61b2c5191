//! [`Command`] for cancelling an [`Order`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Actor, Event, Reason, Transition, TransitionError},
        user, Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling an [`Order`] by a user.
#[derive(Clone, Debug)]
pub struct CancelOrder {
    /// ID of the [`Order`] to be cancelled.
    pub order_id: order::Id,

    /// [`Reason`] of the cancellation.
    pub reason: Reason,

    /// ID of the user cancelling the [`Order`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CancelOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelOrder {
            order_id,
            reason,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Order`.
        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;

        let from = order.status();
        order
            .apply(
                Transition::Cancel {
                    reason,
                    by: Actor::User(initiator_id),
                },
                DateTime::now(),
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Order(id: {order_id})` cancelled by `User(id: {initiator_id})`",
        );
        self.publish(Event::Transitioned {
            id: order_id,
            carrier_id: order.carrier_id,
            from,
            to: order.status(),
        });

        Ok(order)
    }
}

/// Error of [`CancelOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Order`] cannot be cancelled in its current status.
    #[display("{_0}")]
    #[from]
    InvalidTransition(TransitionError),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    OrderNotExists(#[error(not(source))] order::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::SubmitTruck,
        domain::{
            carrier::Plate,
            order::{Actor, Reason, Status},
            user,
        },
        fixtures,
        infra::Database as _,
        Command as _,
    };

    use super::{CancelOrder, ExecutionError as E};

    fn cancel(order_id: crate::domain::order::Id) -> CancelOrder {
        CancelOrder {
            order_id,
            reason: Reason::new("customer withdrew").unwrap(),
            initiator_id: user::Id::new(),
        }
    }

    #[tokio::test]
    async fn cancels_pending_and_approved() {
        let svc = fixtures::service();
        let pending = fixtures::order();
        let approved = fixtures::order();
        for o in [&pending, &approved] {
            svc.database().execute(Insert(o.clone())).await.unwrap();
        }
        svc.execute(SubmitTruck {
            order_id: approved.id,
            carrier_id: approved.carrier_id,
            plate: Plate::new("ABC-123").unwrap(),
        })
        .await
        .unwrap();

        for id in [pending.id, approved.id] {
            let cmd = cancel(id);
            let initiator_id = cmd.initiator_id;

            let order = svc.execute(cmd).await.unwrap();

            let cancellation = order.cancellation().unwrap();
            assert_eq!(order.status(), Status::Cancelled);
            assert_eq!(cancellation.by, Actor::User(initiator_id));
            assert_eq!(cancellation.reason.to_string(), "customer withdrew");
        }
    }

    #[tokio::test]
    async fn cancels_only_once() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let first = svc.execute(cancel(order.id)).await.unwrap();
        let err = svc.execute(cancel(order.id)).await.unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                E::InvalidTransition(e) if e.from == Status::Cancelled,
            ),
            "{err}",
        );
        let stored = svc
            .execute(crate::query::order::ById::by(order.id))
            .await
            .unwrap();
        assert_eq!(stored, Some(first));
    }

    #[tokio::test]
    async fn cancels_once_when_racing() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let (a, b) = tokio::join!(
            svc.execute(cancel(order.id)),
            svc.execute(cancel(order.id)),
        );

        let (ok, err) = match (a, b) {
            (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => (ok, err),
            (a, b) => panic!("expected exactly one cancellation: {a:?}, {b:?}"),
        };
        assert!(
            matches!(
                err.as_ref(),
                E::InvalidTransition(e) if e.from == Status::Cancelled,
            ),
            "{err}",
        );
        let stored = svc
            .execute(crate::query::order::ById::by(order.id))
            .await
            .unwrap();
        assert_eq!(stored, Some(ok));
    }

    #[tokio::test]
    async fn requires_existing_order() {
        let svc = fixtures::service();
        let id = fixtures::order().id;

        let err = svc.execute(cancel(id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), E::OrderNotExists(i) if *i == id));
    }
}
