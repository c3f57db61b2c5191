//! Fuel price [`Record`] definitions.

use common::{datetime::Date, unit, DateTime, DateTimeOf, Price};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Fuel price observed on a specific date.
///
/// There is at most one [`Record`] per [`EffectiveDate`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Record {
    /// [`EffectiveDate`] of this [`Record`].
    pub date: EffectiveDate,

    /// Per-liter fuel price.
    pub price: Price,

    /// [`DateTime`] when this [`Record`] was last written.
    pub recorded_at: RecordingDateTime,
}

/// Calendar date (in UTC) a fuel price [`Record`] is effective on.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct EffectiveDate(Date);

impl EffectiveDate {
    /// Returns the [`EffectiveDate`] of today.
    #[must_use]
    pub fn today() -> Self {
        Self(DateTime::now().date())
    }
}

/// [`DateTime`] when a fuel price [`Record`] was written.
pub type RecordingDateTime = DateTimeOf<(Record, unit::Creation)>;

/// Picks the [`Record`] effective on the provided `date`: the one of that date,
/// if any, or the latest one preceding it otherwise.
pub fn effective_on<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    date: EffectiveDate,
) -> Option<&'r Record> {
    records
        .into_iter()
        .filter(|r| r.date <= date)
        .max_by_key(|r| r.date)
}

#[cfg(test)]
mod spec {
    use common::{DateTime, Price};
    use time::macros::date;

    use super::{effective_on, EffectiveDate, Record};

    fn record(date: time::Date, price: &str) -> Record {
        Record {
            date: date.into(),
            price: price.parse().unwrap(),
            recorded_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn prefers_exact_date() {
        let records = [
            record(date!(2024 - 05 - 01), "1.40"),
            record(date!(2024 - 05 - 03), "1.60"),
            record(date!(2024 - 05 - 02), "1.50"),
        ];

        let found =
            effective_on(&records, EffectiveDate::from(date!(2024 - 05 - 02)));
        assert_eq!(
            found.map(|r| r.price),
            Some("1.50".parse::<Price>().unwrap()),
        );
    }

    #[test]
    fn falls_back_to_latest_prior() {
        let records = [
            record(date!(2024 - 05 - 01), "1.40"),
            record(date!(2024 - 05 - 09), "1.70"),
            record(date!(2024 - 05 - 03), "1.60"),
        ];

        let found =
            effective_on(&records, EffectiveDate::from(date!(2024 - 05 - 05)));
        assert_eq!(found.map(|r| r.date), Some(date!(2024 - 05 - 03).into()));
    }

    #[test]
    fn none_before_first_record() {
        let records = [record(date!(2024 - 05 - 03), "1.60")];

        assert!(effective_on(
            &records,
            EffectiveDate::from(date!(2024 - 05 - 01)),
        )
        .is_none());
        assert!(effective_on(&[], EffectiveDate::today()).is_none());
    }
}
