//! [`Order`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        carrier,
        order::{self, Cancellation, LoadingWindow, State, Status},
        user, Order,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::order::{
        Criteria, Pending, PlateAvailable, PlateClaim, Stats, Truck,
    },
};

/// Columns of an [`Order`] row.
const COLUMNS: &str = "\
    id, company_id, carrier_id, destination_id, \
    loading_starts_at, loading_ends_at, fuel_price, created_at, \
    status, plate, truck_submitted_at, finished_at, \
    cancelled_at, cancellation_reason, cancelled_by";

impl From<Row> for Order {
    fn from(row: Row) -> Self {
        let window = LoadingWindow::new(
            row.get("loading_starts_at"),
            row.get("loading_ends_at"),
        )
        .expect("checked by `orders` table constraint");

        let cancellation = row
            .get::<_, Option<order::CancellationDateTime>>("cancelled_at")
            .map(|at| Cancellation {
                at,
                reason: row.get("cancellation_reason"),
                by: row.get::<_, Option<user::Id>>("cancelled_by").into(),
            });

        let mut order = Order::new(
            row.get("company_id"),
            row.get("carrier_id"),
            row.get("destination_id"),
            window,
            row.get("fuel_price"),
        );
        order.id = row.get("id");
        order.created_at = row.get("created_at");
        order.restore(State {
            plate: row.get("plate"),
            status: row.get("status"),
            truck_submitted_at: row.get("truck_submitted_at"),
            finished_at: row.get("finished_at"),
            cancellation,
        })
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: order::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
             WHERE id = $1::UUID"
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map(Order::from))
    }
}

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let State {
            plate,
            status,
            truck_submitted_at,
            finished_at,
            cancellation,
        } = order.state();
        let (cancelled_at, cancellation_reason, cancelled_by) =
            cancellation.map_or((None, None, None), |c| {
                (Some(c.at), Some(c.reason), c.by.user_id())
            });

        const SQL: &str = "\
            INSERT INTO orders (\
                id, company_id, carrier_id, destination_id, \
                loading_starts_at, loading_ends_at, \
                fuel_price, created_at, \
                status, plate, truck_submitted_at, finished_at, \
                cancelled_at, cancellation_reason, cancelled_by\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ, \
                $7::NUMERIC, $8::TIMESTAMPTZ, \
                $9::INT2, $10::VARCHAR, $11::TIMESTAMPTZ, $12::TIMESTAMPTZ, \
                $13::TIMESTAMPTZ, $14::TEXT, $15::UUID\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                plate = EXCLUDED.plate, \
                truck_submitted_at = EXCLUDED.truck_submitted_at, \
                finished_at = EXCLUDED.finished_at, \
                cancelled_at = EXCLUDED.cancelled_at, \
                cancellation_reason = EXCLUDED.cancellation_reason, \
                cancelled_by = EXCLUDED.cancelled_by";
        self.exec(
            SQL,
            &[
                &order.id,
                &order.company_id,
                &order.carrier_id,
                &order.destination_id,
                &order.window.starts_at(),
                &order.window.ends_at(),
                &order.fuel_price,
                &order.created_at,
                &status,
                &plate,
                &truck_submitted_at,
                &finished_at,
                &cancelled_at,
                &cancellation_reason,
                &cancelled_by,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: order::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM orders \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM orders \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Order, Truck>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, Truck>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Truck { carrier_id, plate } = by.into_inner();

        // Updating on conflict locks the existing row too.
        const SQL: &str = "\
            INSERT INTO trucks_lock \
            VALUES ($1::UUID, $2::VARCHAR) \
            ON CONFLICT (carrier_id, plate) DO UPDATE \
            SET plate = EXCLUDED.plate";
        self.exec(SQL, &[&carrier_id, &plate])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Pending<Order>>, order::CreationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Pending<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Pending<Order>>, order::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let created_before: order::CreationDateTime = by.into_inner();

        // Rows are locked, so concurrent transitions either complete before
        // or wait for the ones selected here.
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
             WHERE status = $1::INT2 \
               AND created_at < $2::TIMESTAMPTZ \
             ORDER BY created_at ASC, id ASC \
             FOR UPDATE"
        );
        self.query(&sql, &[&Status::Pending, &created_before])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter().map(|r| Pending(Order::from(r))).collect()
            })
    }
}

impl<C> Database<Select<By<Vec<Pending<Order>>, carrier::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Pending<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Pending<Order>>, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let carrier_id: carrier::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
             WHERE status = $1::INT2 \
               AND carrier_id = $2::UUID \
             ORDER BY loading_starts_at ASC, id ASC"
        );
        self.query(&sql, &[&Status::Pending, &carrier_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter().map(|r| Pending(Order::from(r))).collect()
            })
    }
}

impl<C> Database<Select<By<Vec<Order>, Criteria>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, Criteria>>,
    ) -> Result<Self::Ok, Self::Err> {
        let criteria = by.into_inner();
        let plate = criteria.plate_part();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM orders \
             WHERE carrier_id = $1::UUID \
               AND ($2::INT2 IS NULL OR status = $2::INT2) \
               AND ($3::UUID IS NULL OR company_id = $3::UUID) \
               AND ($4::UUID IS NULL OR destination_id = $4::UUID) \
               AND ($5::VARCHAR IS NULL \
                    OR strpos(upper(plate), $5::VARCHAR) > 0) \
               AND ($6::TIMESTAMPTZ IS NULL OR created_at >= $6::TIMESTAMPTZ) \
               AND ($7::TIMESTAMPTZ IS NULL OR created_at <= $7::TIMESTAMPTZ) \
             ORDER BY created_at DESC, id ASC"
        );
        self.query(
            &sql,
            &[
                &criteria.carrier_id,
                &criteria.status,
                &criteria.company_id,
                &criteria.destination_id,
                &plate,
                &criteria.created_from,
                &criteria.created_to,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|rows| rows.into_iter().map(Order::from).collect())
    }
}

impl<C> Database<Select<By<PlateAvailable, PlateClaim>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = PlateAvailable;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<PlateAvailable, PlateClaim>>,
    ) -> Result<Self::Ok, Self::Err> {
        let PlateClaim {
            truck: Truck { carrier_id, plate },
            window,
            except,
        } = by.into_inner();
        let active = Status::ALL
            .iter()
            .copied()
            .filter(|s| !s.is_terminal())
            .collect::<Vec<_>>();

        // Windows sharing a boundary instant overlap.
        const SQL: &str = "\
            SELECT NOT EXISTS (\
                SELECT 1 \
                FROM orders \
                WHERE carrier_id = $1::UUID \
                  AND plate = $2::VARCHAR \
                  AND status = ANY($3::INT2[]) \
                  AND loading_starts_at <= $5::TIMESTAMPTZ \
                  AND loading_ends_at >= $4::TIMESTAMPTZ \
                  AND ($6::UUID IS NULL OR id <> $6::UUID)\
            ) AS available";
        self.query_opt(
            SQL,
            &[
                &carrier_id,
                &plate,
                &active,
                &window.starts_at(),
                &window.ends_at(),
                &except,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| {
            row.map_or(true, |r| r.get::<_, bool>("available")).into()
        })
    }
}

impl<C> Database<Select<By<Stats, carrier::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Stats, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let carrier_id: carrier::Id = by.into_inner();

        const SQL: &str = "\
            SELECT status, COUNT(id)::INT8 AS count \
            FROM orders \
            WHERE carrier_id = $1::UUID \
            GROUP BY status";
        self.query(SQL, &[&carrier_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter().fold(Stats::default(), |mut stats, row| {
                    let count = row.get::<_, i64>("count");
                    stats.add(
                        row.get("status"),
                        u64::try_from(count).unwrap_or_default(),
                    );
                    stats
                })
            })
    }
}
