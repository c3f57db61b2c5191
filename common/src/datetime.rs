//! Date and time utilities.
//!
//! Every timestamp of the domain is a [`DateTimeOf`] tagged with what it
//! marks, so a loading start cannot be passed where a contract expiry is
//! expected without an explicit [`DateTimeOf::coerce()`].

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, marker::PhantomData, ops, time::Duration};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::well_known::Rfc3339, UtcOffset};

pub use time::Date;

/// Untyped date and time.
pub type DateTime = DateTimeOf;

/// UTC date and time with microsecond precision, tagged by `Of`.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of the date and time.
    inner: time::OffsetDateTime,

    /// Type parameter describing the kind of date and time.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// A [`DateTime`] representing the Unix epoch.
    pub const UNIX_EPOCH: Self = Self {
        inner: time::OffsetDateTime::UNIX_EPOCH,
        _of: PhantomData,
    };

    /// Creates a new [`DateTime`] representing the current date and time.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn now() -> Self {
        let inner = time::OffsetDateTime::now_utc();
        Self {
            _of: PhantomData,
            inner: inner
                .replace_microsecond(inner.microsecond())
                .expect("infallible"),
        }
    }

    /// Creates a new [`DateTime`] from the provided [RFC 3339] string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [RFC 3339] date and time.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        time::OffsetDateTime::parse(input, &Rfc3339)
            .map_err(E::Parse)?
            .try_into()
            .map_err(E::ComponentRange)
    }

    /// Returns the [`DateTime`] as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Returns the calendar [`Date`] (in UTC) of this [`DateTime`].
    #[must_use]
    pub fn date(&self) -> Date {
        self.inner.date()
    }

    /// Shifts this [`DateTime`] back by the provided `duration`.
    ///
    /// [`None`] is returned if the result is out of range.
    #[must_use]
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        let duration = time::Duration::try_from(duration).ok()?;
        Some(Self {
            inner: self.inner.checked_sub(duration)?,
            _of: PhantomData,
        })
    }

    /// Shifts this [`DateTime`] by the provided number of calendar `years`.
    ///
    /// February 29 is clamped to February 28 when the target year is not a
    /// leap one. [`None`] is returned if the result is out of range.
    #[must_use]
    pub fn checked_add_years(self, years: u16) -> Option<Self> {
        let date = self.inner.date();
        let year = date.year().checked_add(i32::from(years))?;
        let day = date.day().min(date.month().length(year));
        let date = Date::from_calendar_date(year, date.month(), day).ok()?;
        Some(Self {
            inner: self.inner.replace_date(date),
            _of: PhantomData,
        })
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Failed to parse the string into an [`DateTime`].
    Parse(time::error::Parse),

    /// Parsed [`DateTime`] has an out of range component.
    ComponentRange(time::error::ComponentRange),
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> TryFrom<time::OffsetDateTime> for DateTimeOf<Of> {
    type Error = time::error::ComponentRange;

    fn try_from(dt: time::OffsetDateTime) -> Result<Self, Self::Error> {
        dt.to_offset(UtcOffset::UTC)
            .replace_microsecond(dt.microsecond())
            .map(|inner| Self {
                inner,
                _of: PhantomData,
            })
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            inner: self.inner + rhs,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> ops::Sub<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self {
            inner: self.inner - rhs,
            _of: PhantomData,
        }
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw)?
            .try_into()
            .map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::DateTime;

    #[test]
    fn adds_years() {
        let dt = DateTime::from_rfc3339("2024-03-15T10:30:00Z").unwrap();
        assert_eq!(
            dt.checked_add_years(1).unwrap(),
            DateTime::from_rfc3339("2025-03-15T10:30:00Z").unwrap(),
        );
        assert_eq!(dt.checked_add_years(0).unwrap(), dt);
    }

    #[test]
    fn clamps_leap_day() {
        let dt = DateTime::from_rfc3339("2024-02-29T00:00:00Z").unwrap();
        assert_eq!(
            dt.checked_add_years(1).unwrap(),
            DateTime::from_rfc3339("2025-02-28T00:00:00Z").unwrap(),
        );
        assert_eq!(
            dt.checked_add_years(4).unwrap(),
            DateTime::from_rfc3339("2028-02-29T00:00:00Z").unwrap(),
        );
    }

    #[test]
    fn keeps_end_of_long_months() {
        let dt = DateTime::from_rfc3339("2023-01-31T23:59:59Z").unwrap();
        assert_eq!(
            dt.checked_add_years(1).unwrap(),
            DateTime::from_rfc3339("2024-01-31T23:59:59Z").unwrap(),
        );
        let dt = DateTime::from_rfc3339("2023-02-28T12:00:00Z").unwrap();
        assert_eq!(
            dt.checked_add_years(1).unwrap(),
            DateTime::from_rfc3339("2024-02-28T12:00:00Z").unwrap(),
        );
    }

    #[test]
    fn subtracts_within_range_only() {
        let dt = DateTime::from_rfc3339("2024-03-15T10:30:00Z").unwrap();
        assert_eq!(
            dt.checked_sub(Duration::from_secs(24 * 60 * 60)).unwrap(),
            DateTime::from_rfc3339("2024-03-14T10:30:00Z").unwrap(),
        );
        assert!(dt.checked_sub(Duration::from_secs(u64::MAX / 2)).is_none());
        assert!(dt.checked_sub(Duration::MAX).is_none());
    }

    #[test]
    fn date_is_utc() {
        let dt = DateTime::from_rfc3339("2024-06-01T23:30:00-02:00").unwrap();
        assert_eq!(dt.date().to_string(), "2024-06-02");
    }
}
