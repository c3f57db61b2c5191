//! [`Command`] for finishing an [`Order`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Event, Transition, TransitionError},
        user, Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for finishing a delivered [`Order`].
#[derive(Clone, Copy, Debug)]
pub struct FinishOrder {
    /// ID of the [`Order`] to be finished.
    pub order_id: order::Id,

    /// ID of the user confirming the delivery.
    pub initiator_id: user::Id,
}

impl<Db> Command<FinishOrder> for Service<Db>
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

    async fn execute(&self, cmd: FinishOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FinishOrder {
            order_id,
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
            .apply(Transition::Finish, DateTime::now())
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
            "`Order(id: {order_id})` finished by `User(id: {initiator_id})`",
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

/// Error of [`FinishOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Order`] cannot be finished in its current status.
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
        command::{cancel_order, CancelOrder, SubmitTruck},
        domain::{
            carrier::Plate,
            order::{Reason, Status},
            user,
        },
        fixtures,
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError as E, FinishOrder};

    #[tokio::test]
    async fn full_lifecycle() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let approved = svc
            .execute(SubmitTruck {
                order_id: order.id,
                carrier_id: order.carrier_id,
                plate: Plate::new("ABC-123").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(approved.status(), Status::Approved);
        assert!(approved.truck_submitted_at().is_some());

        let finished = svc
            .execute(FinishOrder {
                order_id: order.id,
                initiator_id: user::Id::new(),
            })
            .await
            .unwrap();
        assert_eq!(finished.status(), Status::Finished);
        assert!(finished.finished_at().is_some());

        let err = svc
            .execute(CancelOrder {
                order_id: order.id,
                reason: Reason::new("too late").unwrap(),
                initiator_id: user::Id::new(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                cancel_order::ExecutionError::InvalidTransition(e)
                    if e.from == Status::Finished && e.to == Status::Cancelled,
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn requires_approved_order() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let err = svc
            .execute(FinishOrder {
                order_id: order.id,
                initiator_id: user::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                E::InvalidTransition(e) if e.from == Status::Pending,
            ),
            "{err}",
        );
    }
}
