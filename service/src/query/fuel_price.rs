//! [`CurrentFuelPrice`] definition.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::fuel_price::{EffectiveDate, Record},
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] for the fuel price [`Record`] effective today: the one of today,
/// if recorded, or the latest one before it otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentFuelPrice;

impl<Db> Query<CurrentFuelPrice> for Service<Db>
where
    Db: Database<
        Select<By<Option<Record>, EffectiveDate>>,
        Ok = Option<Record>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Record;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: CurrentFuelPrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        self.database()
            .execute(Select(By::<Option<Record>, _>::new(
                EffectiveDate::today(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoFuelPrice)
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`CurrentFuelPrice`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No fuel price is recorded on or before today.
    #[display("No fuel price is recorded yet")]
    NoFuelPrice,
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;
    use time::Duration;

    use crate::{
        domain::fuel_price::{EffectiveDate, Record},
        fixtures,
        infra::Database as _,
        Query as _,
    };

    use super::{CurrentFuelPrice, ExecutionError as E};

    fn record(date: EffectiveDate, price: &str) -> Record {
        Record {
            date,
            price: fixtures::price(price),
            recorded_at: common::DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn falls_back_to_latest_past_record() {
        let svc = fixtures::service();
        let today = EffectiveDate::today();
        let days_ago = |n| {
            EffectiveDate::from(time::Date::from(today) - Duration::days(n))
        };
        for r in [record(days_ago(3), "1.50"), record(days_ago(1), "1.55")] {
            svc.database().execute(Insert(r)).await.unwrap();
        }

        let current = svc.execute(CurrentFuelPrice).await.unwrap();
        assert_eq!(current.price, fixtures::price("1.55"));

        svc.database()
            .execute(Insert(record(today, "1.60")))
            .await
            .unwrap();
        let current = svc.execute(CurrentFuelPrice).await.unwrap();
        assert_eq!(current.price, fixtures::price("1.60"));
    }

    #[tokio::test]
    async fn fails_without_records() {
        let svc = fixtures::service();

        let err = svc.execute(CurrentFuelPrice).await.unwrap_err();

        assert!(matches!(err.as_ref(), E::NoFuelPrice), "{err}");
    }
}
