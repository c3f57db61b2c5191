//! [`Command`] for recording a fuel price.

use common::{operations::Insert, DateTime, Price};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::fuel_price::{EffectiveDate, Record},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a fuel price effective on some date.
///
/// Recording a price for a date having one already replaces it.
#[derive(Clone, Copy, Debug)]
pub struct RecordFuelPrice {
    /// Per-liter fuel price.
    pub price: Price,

    /// [`EffectiveDate`] of the price.
    ///
    /// [`EffectiveDate::today()`], if [`None`].
    pub date: Option<EffectiveDate>,
}

impl<Db> Command<RecordFuelPrice> for Service<Db>
where
    Db: Database<Insert<Record>, Err = Traced<database::Error>>,
{
    type Ok = Record;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordFuelPrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordFuelPrice { price, date } = cmd;

        if price.is_zero() {
            return Err(tracerr::new!(E::NonPositivePrice));
        }

        let record = Record {
            date: date.unwrap_or_else(EffectiveDate::today),
            price,
            recorded_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(record))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("Fuel price {} recorded for {}", record.price, record.date);

        Ok(record)
    }
}

/// Error of [`RecordFuelPrice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Fuel price is not positive.
    #[display("Fuel price must be positive")]
    NonPositivePrice,
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Price,
    };
    use time::macros::date;

    use crate::{
        domain::fuel_price::{EffectiveDate, Record},
        fixtures,
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError as E, RecordFuelPrice};

    #[tokio::test]
    async fn records_for_today_by_default() {
        let svc = fixtures::service();

        let record = svc
            .execute(RecordFuelPrice {
                price: fixtures::price("1.72"),
                date: None,
            })
            .await
            .unwrap();

        assert_eq!(record.date, EffectiveDate::today());
    }

    #[tokio::test]
    async fn replaces_record_of_same_date() {
        let svc = fixtures::service();
        let date = EffectiveDate::from(date!(2024 - 03 - 01));

        for price in ["1.70", "1.75"] {
            svc.execute(RecordFuelPrice {
                price: fixtures::price(price),
                date: Some(date),
            })
            .await
            .unwrap();
        }

        let stored = svc
            .database()
            .execute(Select(By::<Option<Record>, _>::new(date)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.price, fixtures::price("1.75"));
    }

    #[tokio::test]
    async fn rejects_zero_price() {
        let svc = fixtures::service();

        let err = svc
            .execute(RecordFuelPrice {
                price: Price::ZERO,
                date: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::NonPositivePrice), "{err}");
    }
}
