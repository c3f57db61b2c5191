//! [`Query`] collection related to [`Order`]s.

use common::operations::By;

use crate::{
    domain::{carrier, order, Order},
    read::order::{Criteria, Pending, PlateAvailable, PlateClaim, Stats},
};
#[cfg(doc)]
use crate::Query;

use super::Lookup;

/// Queries an [`Order`] by its [`order::Id`].
pub type ById = Lookup<By<Option<Order>, order::Id>>;

/// Queries [`Pending`] [`Order`]s assigned to a carrier, ordered by the start
/// of their loading windows.
pub type PendingOfCarrier = Lookup<By<Vec<Pending<Order>>, carrier::Id>>;

/// Searches [`Order`]s of a carrier satisfying the provided [`Criteria`],
/// the most recently created first.
pub type Search = Lookup<By<Vec<Order>, Criteria>>;

/// Queries [`Order`] [`Stats`] of a carrier.
pub type StatsOfCarrier = Lookup<By<Stats, carrier::Id>>;

/// Queries whether a truck may be approved for a loading window without
/// conflicting with the [`Order`]s it's approved for already.
pub type PlateAvailability = Lookup<By<PlateAvailable, PlateClaim>>;

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime};

    use crate::{
        domain::{
            carrier,
            order::{Status, Transition},
        },
        fixtures,
        infra::Database as _,
        read::order::{Criteria, PlateClaim, Truck},
        Query as _,
    };

    use super::{PendingOfCarrier, PlateAvailability, Search, StatsOfCarrier};

    #[tokio::test]
    async fn lists_pending_orders_by_loading_start() {
        let svc = fixtures::service();
        let carrier_id = carrier::Id::new();
        let order = |from, to| {
            let mut order = fixtures::order();
            order.carrier_id = carrier_id;
            order.window = fixtures::window(from, to);
            order
        };
        let (late, early) = (order(5, 6), order(1, 2));
        for o in [late.clone(), early.clone(), fixtures::order()] {
            svc.database().execute(Insert(o)).await.unwrap();
        }

        let pending =
            svc.execute(PendingOfCarrier::by(carrier_id)).await.unwrap();

        let ids = pending.into_iter().map(|p| p.0.id).collect::<Vec<_>>();
        assert_eq!(ids, [early.id, late.id]);
    }

    #[tokio::test]
    async fn counts_orders_by_status() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let stats = svc
            .execute(StatsOfCarrier::by(order.carrier_id))
            .await
            .unwrap();

        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.completion_rate(), Some(0.0));

        let mut finished = fixtures::order();
        finished.carrier_id = order.carrier_id;
        for transition in [
            Transition::Approve {
                plate: "AB-123-C".parse().unwrap(),
            },
            Transition::Finish,
        ] {
            finished.apply(transition, DateTime::now()).unwrap();
        }
        svc.database().execute(Insert(finished)).await.unwrap();

        let stats = svc
            .execute(StatsOfCarrier::by(order.carrier_id))
            .await
            .unwrap();

        assert_eq!((stats.pending, stats.finished), (1, 1));
        assert_eq!(stats.completion_rate(), Some(50.0));
    }

    #[tokio::test]
    async fn no_completion_rate_without_orders() {
        let svc = fixtures::service();

        let stats =
            svc.execute(StatsOfCarrier::by(carrier::Id::new())).await.unwrap();

        assert_eq!(stats.total(), 0);
        assert_eq!(stats.completion_rate(), None);
    }

    #[tokio::test]
    async fn pending_orders_keep_plate_available() {
        let svc = fixtures::service();
        let order = fixtures::order();
        svc.database().execute(Insert(order.clone())).await.unwrap();

        let available = svc
            .execute(PlateAvailability::by(PlateClaim {
                truck: Truck {
                    carrier_id: order.carrier_id,
                    plate: "AB-123-C".parse().unwrap(),
                },
                window: order.window,
                except: None,
            }))
            .await
            .unwrap();

        assert!(*available);
    }

    #[tokio::test]
    async fn searches_orders_by_criteria() {
        let svc = fixtures::service();
        let carrier_id = carrier::Id::new();
        let order = || {
            let mut order = fixtures::order();
            order.carrier_id = carrier_id;
            order
        };
        let pending = order();
        let mut approved = order();
        approved
            .apply(
                Transition::Approve {
                    plate: "AB-123-C".parse().unwrap(),
                },
                DateTime::now(),
            )
            .unwrap();
        let mut of_company = order();
        of_company.company_id = pending.company_id;
        of_company.created_at = (DateTime::now() + fixtures::DAY).coerce();
        for o in [&pending, &approved, &of_company, &fixtures::order()] {
            svc.database().execute(Insert(o.clone())).await.unwrap();
        }
        let svc = &svc;
        let search = |criteria: Criteria| async move {
            svc.execute(Search::by(criteria))
                .await
                .unwrap()
                .into_iter()
                .map(|o| o.id)
                .collect::<Vec<_>>()
        };

        let all = search(Criteria::new(carrier_id)).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], of_company.id, "newest first");

        let mut by_status = Criteria::new(carrier_id);
        by_status.status = Some(Status::Approved);
        assert_eq!(search(by_status).await, [approved.id]);

        let mut by_plate = Criteria::new(carrier_id);
        by_plate.plate = Some(" b-12 ".into());
        assert_eq!(search(by_plate).await, [approved.id]);

        let mut by_company = Criteria::new(carrier_id);
        by_company.company_id = Some(pending.company_id);
        by_company.created_to = Some(pending.created_at);
        assert_eq!(search(by_company).await, [pending.id]);

        let mut by_destination = Criteria::new(carrier_id);
        by_destination.destination_id = Some(approved.destination_id);
        by_destination.created_from = Some(approved.created_at);
        assert_eq!(search(by_destination).await, [approved.id]);
    }
}
