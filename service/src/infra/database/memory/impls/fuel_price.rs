//! Fuel price [`Record`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::fuel_price::{self, EffectiveDate, Record},
    infra::{
        database::{self, memory::Access, Memory},
        Database,
    },
};

impl<S: Access> Database<Select<By<Option<Record>, EffectiveDate>>>
    for Memory<S>
{
    type Ok = Option<Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Record>, EffectiveDate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let date = by.into_inner();
        self.with(|s| {
            fuel_price::effective_on(s.fuel_prices.values(), date).copied()
        })
        .await
    }
}

impl<S: Access> Database<Insert<Record>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(record): Insert<Record>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            _ = s.fuel_prices.insert(record.date, record);
        })
        .await
    }
}
