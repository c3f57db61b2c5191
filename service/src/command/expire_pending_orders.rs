//! [`Command`] for cancelling expired pending [`Order`]s.

use std::time::Duration;

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Actor, Event, Reason, Status, Transition},
        Order,
    },
    infra::{database, Database},
    read::order::Pending,
    Service,
};

use super::Command;

/// [`Command`] for cancelling [`Status::Pending`] [`Order`]s nobody submitted
/// a truck for within the `threshold`.
///
/// Returns the number of cancelled [`Order`]s.
#[derive(Clone, Copy, Debug)]
pub struct ExpirePendingOrders {
    /// Age after which a [`Status::Pending`] [`Order`] is considered expired.
    pub threshold: Duration,
}

impl<Db> Command<ExpirePendingOrders> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Pending<Order>>, order::CreationDateTime>>,
            Ok = Vec<Pending<Order>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ExpirePendingOrders,
    ) -> Result<Self::Ok, Self::Err> {
        let ExpirePendingOrders { threshold } = cmd;

        let now = DateTime::now();
        let created_before: order::CreationDateTime = now
            .checked_sub(threshold)
            .ok_or_else(|| {
                tracerr::new!(ExecutionError::ThresholdOutOfRange(threshold))
            })?
            .coerce();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        // Selected `Order`s stay locked till the end of the transaction.
        let expired = tx
            .execute(Select(By::<Vec<Pending<Order>>, _>::new(created_before)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let mut cancelled = Vec::with_capacity(expired.len());
        for Pending(mut order) in expired {
            let transition = Transition::Cancel {
                reason: Reason::expired(),
                by: Actor::System,
            };
            if let Err(e) = order.apply(transition, now) {
                log::warn!("skipping expired `Order(id: {})`: {e}", order.id);
                continue;
            }

            tx.execute(Insert(order.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
                .map(drop)?;
            cancelled.push(order);
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
            .map(drop)?;

        for order in &cancelled {
            log::debug!("`Order(id: {})` expired", order.id);
            self.publish(Event::Transitioned {
                id: order.id,
                carrier_id: order.carrier_id,
                from: Status::Pending,
                to: order.status(),
            });
        }

        Ok(cancelled.len())
    }
}

/// Error of [`ExpirePendingOrders`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// `threshold` reaches beyond the representable [`DateTime`]s.
    #[display("Threshold `{_0:?}` is out of range")]
    ThresholdOutOfRange(#[error(not(source))] Duration),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Insert, DateTime};

    use crate::{
        command::SubmitTruck,
        domain::{
            carrier::Plate,
            order::{Actor, Reason, Status},
            Order,
        },
        fixtures::{self, DAY},
        infra::Database as _,
        query, Command as _,
    };

    use super::{ExecutionError as E, ExpirePendingOrders};

    fn created_days_ago(days: u32) -> Order {
        let mut order = fixtures::order();
        order.created_at = (DateTime::now() - days * DAY).coerce();
        order
    }

    #[tokio::test]
    async fn cancels_only_expired_pending_orders() {
        let svc = fixtures::service();
        let stale = created_days_ago(4);
        let fresh = created_days_ago(1);
        let approved = created_days_ago(5);
        for o in [&stale, &fresh, &approved] {
            svc.database().execute(Insert(o.clone())).await.unwrap();
        }
        svc.execute(SubmitTruck {
            order_id: approved.id,
            carrier_id: approved.carrier_id,
            plate: Plate::new("ABC-123").unwrap(),
        })
        .await
        .unwrap();
        let mut events = svc.subscribe();

        let count = svc
            .execute(ExpirePendingOrders {
                threshold: 3 * DAY,
            })
            .await
            .unwrap();

        assert_eq!(count, 1);

        let stale = svc
            .execute(query::order::ById::by(stale.id))
            .await
            .unwrap()
            .unwrap();
        let cancellation = stale.cancellation().unwrap();
        assert_eq!(stale.status(), Status::Cancelled);
        assert_eq!(cancellation.by, Actor::System);
        assert_eq!(cancellation.reason, Reason::expired());

        for (id, status) in
            [(fresh.id, Status::Pending), (approved.id, Status::Approved)]
        {
            let order = svc
                .execute(query::order::ById::by(id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(order.status(), status);
        }

        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn rejects_out_of_range_threshold() {
        let svc = fixtures::service();
        let stale = created_days_ago(10);
        svc.database().execute(Insert(stale.clone())).await.unwrap();

        let err = svc
            .execute(ExpirePendingOrders {
                threshold: Duration::from_secs(u64::MAX / 2),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), E::ThresholdOutOfRange(_)),
            "{err}",
        );
        let stale = svc
            .execute(query::order::ById::by(stale.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.status(), Status::Pending);
    }

    #[tokio::test]
    async fn repeated_sweep_is_noop() {
        let svc = fixtures::service();
        let stale = created_days_ago(10);
        svc.database().execute(Insert(stale)).await.unwrap();

        let cmd = ExpirePendingOrders {
            threshold: 3 * DAY,
        };
        assert_eq!(svc.execute(cmd).await.unwrap(), 1);
        assert_eq!(svc.execute(cmd).await.unwrap(), 0);
    }
}
