//! Fuel price [`Record`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::fuel_price::{EffectiveDate, Record},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Record>, EffectiveDate>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Record>, EffectiveDate>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let date: EffectiveDate = by.into_inner();

        const SQL: &str = "\
            SELECT date, price, recorded_at \
            FROM fuel_prices \
            WHERE date <= $1::DATE \
            ORDER BY date DESC \
            LIMIT 1";
        self.query_opt(SQL, &[&date])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| {
                row.map(|row| Record {
                    date: row.get("date"),
                    price: row.get("price"),
                    recorded_at: row.get("recorded_at"),
                })
            })
    }
}

impl<C> Database<Insert<Record>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(record): Insert<Record>,
    ) -> Result<Self::Ok, Self::Err> {
        let Record {
            date,
            price,
            recorded_at,
        } = record;

        const SQL: &str = "\
            INSERT INTO fuel_prices (date, price, recorded_at) \
            VALUES ($1::DATE, $2::NUMERIC, $3::TIMESTAMPTZ) \
            ON CONFLICT (date) DO UPDATE \
            SET price = EXCLUDED.price, \
                recorded_at = EXCLUDED.recorded_at";
        self.exec(SQL, &[&date, &price, &recorded_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
