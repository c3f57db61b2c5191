//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    DateTime,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{carrier, contract, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::contract::Active,
};

/// Columns of a [`Contract`] row.
const COLUMNS: &str = "\
    id, number, carrier_id, fuel_price, value, created_at, expires_at";

impl From<Row> for Contract {
    fn from(row: Row) -> Self {
        Self {
            id: row.get("id"),
            number: row.get("number"),
            carrier_id: row.get("carrier_id"),
            fuel_price: row.get("fuel_price"),
            value: row.get("value"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE id = $1::UUID"
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map(Contract::from))
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Number>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: contract::Number = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE number = $1::VARCHAR"
        );
        self.query_opt(&sql, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map(Contract::from))
    }
}

impl<C> Database<Select<By<Vec<contract::Number>, contract::RenewalPrefix>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<contract::Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<contract::Number>, contract::RenewalPrefix>>,
    ) -> Result<Self::Ok, Self::Err> {
        let prefix = by.into_inner();

        // `LIKE` is avoided, as `_` is allowed in `contract::Number`s.
        const SQL: &str = "\
            SELECT number \
            FROM contracts \
            WHERE starts_with(number, $1::VARCHAR)";
        self.query(SQL, &[&AsRef::<str>::as_ref(&prefix)])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| rows.into_iter().map(|r| r.get("number")).collect())
    }
}

impl<C> Database<Select<By<Vec<Active<Contract>>, carrier::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<Contract>>, carrier::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let carrier_id: carrier::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE carrier_id = $1::UUID \
               AND expires_at > $2::TIMESTAMPTZ \
             ORDER BY expires_at DESC, number ASC"
        );
        self.query(&sql, &[&carrier_id, &DateTime::now()])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter().map(|r| Active(Contract::from(r))).collect()
            })
    }
}

impl<C>
    Database<Select<By<Vec<Active<Contract>>, contract::ExpirationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Active<Contract>>, contract::ExpirationDateTime>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let until = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE expires_at > $1::TIMESTAMPTZ \
               AND expires_at <= $2::TIMESTAMPTZ \
             ORDER BY expires_at ASC, number ASC"
        );
        self.query(&sql, &[&DateTime::now(), &until])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter().map(|r| Active(Contract::from(r))).collect()
            })
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            number,
            carrier_id,
            fuel_price,
            value,
            created_at,
            expires_at,
        } = contract;

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, number, carrier_id, \
                fuel_price, value, \
                created_at, expires_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, \
                $4::NUMERIC, $5::NUMERIC, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                carrier_id = EXCLUDED.carrier_id, \
                fuel_price = EXCLUDED.fuel_price, \
                value = EXCLUDED.value, \
                created_at = EXCLUDED.created_at, \
                expires_at = EXCLUDED.expires_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &carrier_id,
                &fuel_price,
                &value,
                &created_at,
                &expires_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: contract::Number = by.into_inner();

        // Updating on conflict locks the existing row too.
        const SQL: &str = "\
            INSERT INTO contract_numbers_lock \
            VALUES ($1::VARCHAR) \
            ON CONFLICT (number) DO UPDATE \
            SET number = EXCLUDED.number";
        self.exec(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::RenewalPrefix>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::RenewalPrefix>>,
    ) -> Result<Self::Ok, Self::Err> {
        let prefix = by.into_inner();

        const SQL: &str = "\
            INSERT INTO contract_renewals_lock \
            VALUES ($1::VARCHAR) \
            ON CONFLICT (prefix) DO UPDATE \
            SET prefix = EXCLUDED.prefix";
        self.exec(SQL, &[&AsRef::<str>::as_ref(&prefix)])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
