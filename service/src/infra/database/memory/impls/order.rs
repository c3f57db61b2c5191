//! [`Order`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{carrier, order, Order},
    infra::{
        database::{self, memory::Access, Memory},
        Database,
    },
    read::order::{Criteria, Pending, PlateAvailable, PlateClaim, Stats},
};

impl<S: Access> Database<Select<By<Option<Order>, order::Id>>> for Memory<S> {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.orders.get(&id).cloned()).await
    }
}

impl<S: Access> Database<Insert<Order>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            _ = s.orders.insert(order.id, order);
        })
        .await
    }
}

impl<S: Access> Database<Delete<By<Order, order::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| {
            _ = s.orders.remove(&id);
        })
        .await
    }
}

impl<S: Access>
    Database<Select<By<Vec<Pending<Order>>, order::CreationDateTime>>>
    for Memory<S>
{
    type Ok = Vec<Pending<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Pending<Order>>, order::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let created_before = by.into_inner();
        self.with(|s| {
            let mut orders = s
                .orders
                .values()
                .filter(|o| {
                    o.status() == order::Status::Pending
                        && o.created_at < created_before
                })
                .cloned()
                .collect::<Vec<_>>();
            orders.sort_by_key(|o| (o.created_at, o.id));
            orders.into_iter().map(Pending).collect()
        })
        .await
    }
}

impl<S: Access> Database<Select<By<Vec<Pending<Order>>, carrier::Id>>>
    for Memory<S>
{
    type Ok = Vec<Pending<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Pending<Order>>, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let carrier_id = by.into_inner();
        self.with(|s| {
            let mut orders = s
                .orders
                .values()
                .filter(|o| {
                    o.status() == order::Status::Pending
                        && o.carrier_id == carrier_id
                })
                .cloned()
                .collect::<Vec<_>>();
            orders.sort_by_key(|o| (o.window.starts_at(), o.id));
            orders.into_iter().map(Pending).collect()
        })
        .await
    }
}

impl<S: Access> Database<Select<By<Vec<Order>, Criteria>>> for Memory<S> {
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, Criteria>>,
    ) -> Result<Self::Ok, Self::Err> {
        let criteria = by.key();
        self.with(|s| {
            let mut orders = s
                .orders
                .values()
                .filter(|o| criteria.matches(o))
                .cloned()
                .collect::<Vec<_>>();
            orders.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
            });
            orders
        })
        .await
    }
}

impl<S: Access> Database<Select<By<PlateAvailable, PlateClaim>>> for Memory<S> {
    type Ok = PlateAvailable;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<PlateAvailable, PlateClaim>>,
    ) -> Result<Self::Ok, Self::Err> {
        let claim = by.key();
        self.with(|s| {
            PlateAvailable::from(
                !s.orders.values().any(|o| claim.conflicts_with(o)),
            )
        })
        .await
    }
}

impl<S: Access> Database<Select<By<Stats, carrier::Id>>> for Memory<S> {
    type Ok = Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Stats, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let carrier_id = by.into_inner();
        self.with(|s| {
            s.orders
                .values()
                .filter(|o| o.carrier_id == carrier_id)
                .fold(Stats::default(), |mut stats, o| {
                    stats.count(o.status());
                    stats
                })
        })
        .await
    }
}
