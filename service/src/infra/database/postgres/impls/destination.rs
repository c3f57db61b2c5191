//! [`Destination`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    DateTime,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, destination, pricing::Candidate, Contract, Destination},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::contract::Active,
};

/// Columns of a [`Destination`] row.
const COLUMNS: &str = "\
    id, contract_id, city, country, \
    base_price, contract_fuel_price, created_at";

impl From<Row> for Destination {
    fn from(row: Row) -> Self {
        Self {
            id: row.get("id"),
            contract_id: row.get("contract_id"),
            city: row.get("city"),
            country: row.get("country"),
            base_price: row.get("base_price"),
            contract_fuel_price: row.get("contract_fuel_price"),
            created_at: row.get("created_at"),
        }
    }
}

impl<C> Database<Select<By<Option<Destination>, destination::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Destination>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Destination>, destination::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: destination::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM destinations \
             WHERE id = $1::UUID"
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map(Destination::from))
    }
}

impl<C>
    Database<
        Select<By<Option<Destination>, (contract::Id, destination::City)>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Destination>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Destination>, (contract::Id, destination::City)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, city) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM destinations \
             WHERE contract_id = $1::UUID \
               AND city = $2::VARCHAR"
        );
        self.query_opt(&sql, &[&contract_id, &city])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map(Destination::from))
    }
}

impl<C> Database<Insert<Destination>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(destination): Insert<Destination>,
    ) -> Result<Self::Ok, Self::Err> {
        let Destination {
            id,
            contract_id,
            city,
            country,
            base_price,
            contract_fuel_price,
            created_at,
        } = destination;

        const SQL: &str = "\
            INSERT INTO destinations (\
                id, contract_id, city, country, \
                base_price, contract_fuel_price, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::CHAR(2), \
                $5::NUMERIC, $6::NUMERIC, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_id = EXCLUDED.contract_id, \
                city = EXCLUDED.city, \
                country = EXCLUDED.country, \
                base_price = EXCLUDED.base_price, \
                contract_fuel_price = EXCLUDED.contract_fuel_price, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &city,
                &country,
                &base_price,
                &contract_fuel_price,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Destination, (contract::Id, destination::City)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Destination, (contract::Id, destination::City)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, city) = by.into_inner();

        // Updating on conflict locks the existing row too.
        const SQL: &str = "\
            INSERT INTO destinations_lock \
            VALUES ($1::UUID, $2::VARCHAR) \
            ON CONFLICT (contract_id, city) DO UPDATE \
            SET city = EXCLUDED.city";
        self.exec(SQL, &[&contract_id, &city])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Active<Candidate>>, destination::City>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Active<Candidate>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<Candidate>>, destination::City>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let city: destination::City = by.into_inner();
        let now = DateTime::now();

        const SQL: &str = "\
            SELECT d.id, d.contract_id, d.city, d.country, \
                   d.base_price, d.contract_fuel_price, \
                   d.created_at AS destination_created_at, \
                   c.number, c.carrier_id, c.fuel_price, c.value, \
                   c.created_at, c.expires_at \
            FROM destinations AS d \
            INNER JOIN contracts AS c ON c.id = d.contract_id \
            WHERE d.city = $1::VARCHAR \
              AND c.expires_at > $2::TIMESTAMPTZ";
        self.query(SQL, &[&city, &now])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter()
                    .map(|row| {
                        Active(Candidate {
                            contract: Contract {
                                id: row.get("contract_id"),
                                number: row.get("number"),
                                carrier_id: row.get("carrier_id"),
                                fuel_price: row.get("fuel_price"),
                                value: row.get("value"),
                                created_at: row.get("created_at"),
                                expires_at: row.get("expires_at"),
                            },
                            destination: Destination {
                                id: row.get("id"),
                                contract_id: row.get("contract_id"),
                                city: row.get("city"),
                                country: row.get("country"),
                                base_price: row.get("base_price"),
                                contract_fuel_price: row
                                    .get("contract_fuel_price"),
                                created_at: row.get("destination_created_at"),
                            },
                        })
                    })
                    .collect()
            })
    }
}
