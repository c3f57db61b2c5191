//! [`Command`] for deleting an [`Order`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Event, Status},
        Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Order`] nobody has acted upon yet.
#[derive(Clone, Copy, Debug)]
pub struct DeleteOrder {
    /// ID of the [`Order`] to be deleted.
    pub order_id: order::Id,
}

impl<Db> Command<DeleteOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteOrder { order_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid deleting an `Order` being transitioned concurrently.
        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if !order.is_deletable() {
            return Err(tracerr::new!(E::ConflictingState(order.status())));
        }

        tx.execute(Delete(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Order(id: {order_id})` deleted");
        self.publish(Event::Deleted { id: order_id });

        Ok(())
    }
}

/// Error of [`DeleteOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Order`] is not in the [`Status::Pending`] anymore.
    #[display("`Order` in `{_0}` status cannot be deleted")]
    ConflictingState(#[error(not(source))] Status),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    OrderNotExists(#[error(not(source))] order::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::SubmitTruck,
        domain::{carrier::Plate, order::Status},
        fixtures,
        infra::Database as _,
        query, Command as _,
    };

    use super::{DeleteOrder, ExecutionError as E};

    #[tokio::test]
    async fn deletes_pending_order() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        svc.execute(DeleteOrder { order_id: order.id }).await.unwrap();

        let found = svc
            .execute(query::order::ById::by(order.id))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn keeps_approved_order() {
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

        let err = svc
            .execute(DeleteOrder { order_id: order.id })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), E::ConflictingState(Status::Approved)),
            "{err}",
        );
        let found = svc
            .execute(query::order::ById::by(order.id))
            .await
            .unwrap();
        assert_eq!(found, Some(approved));
    }

    #[tokio::test]
    async fn requires_existing_order() {
        let svc = fixtures::service();

        let err = svc
            .execute(DeleteOrder {
                order_id: fixtures::order().id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::OrderNotExists(_)), "{err}");
    }
}
