//! [`Destination`] definitions.

use std::sync::LazyLock;

use common::{unit, DateTimeOf, Price};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, pricing};
#[cfg(doc)]
use crate::domain::Contract;

/// Deliverable city served under exactly one [`Contract`].
///
/// There is at most one [`Destination`] per [`City`] and [`Contract`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Destination {
    /// ID of this [`Destination`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Destination`] is served under.
    pub contract_id: contract::Id,

    /// [`City`] of this [`Destination`].
    pub city: City,

    /// [`Country`] of this [`Destination`].
    pub country: Country,

    /// Price negotiated for delivering to this [`Destination`].
    pub base_price: Price,

    /// Fuel price locked in by the [`Contract`], copied at creation.
    pub contract_fuel_price: Price,

    /// [`DateTime`] when this [`Destination`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Destination {
    /// Computes the price of delivering to this [`Destination`] given the
    /// `current` fuel price.
    #[must_use]
    pub fn adjusted_price(&self, current: Price) -> Price {
        pricing::adjusted_price(
            self.base_price,
            current,
            self.contract_fuel_price,
        )
    }
}

/// ID of a [`Destination`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// City of a [`Destination`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct City(String);

impl City {
    /// Creates a new [`City`] if the given `city` is valid.
    #[must_use]
    pub fn new(city: impl Into<String>) -> Option<Self> {
        let city = city.into();
        Self::check(&city).then_some(Self(city))
    }

    /// Checks whether the given `city` is a valid [`City`].
    fn check(city: impl AsRef<str>) -> bool {
        /// Regular expression checking [`City`] format:
        /// - Must start with a letter;
        /// - Must consist of letters, digits, spaces, and `'.-` punctuation;
        /// - Must not end with a space;
        /// - Must be between 1 and 100 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\p{L}(?:[\p{L}\p{M}\p{N} '.-]{0,98}[\p{L}\p{M}\p{N}.])?$")
                .expect("valid regex")
        });

        REGEX.is_match(city.as_ref())
    }
}

impl FromStr for City {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `City`")
    }
}

/// [ISO 3166-1 alpha-2] code of a [`Destination`] country.
///
/// [ISO 3166-1 alpha-2]: https://en.wikipedia.org/wiki/ISO_3166-1_alpha-2
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Country(String);

impl Country {
    /// Creates a new [`Country`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        (code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()))
            .then_some(Self(code))
    }
}

impl FromStr for Country {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Country`")
    }
}

/// [`DateTime`] when a [`Destination`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Destination, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{City, Country};

    #[test]
    fn city_format() {
        for valid in ["Rotterdam", "Ústí nad Labem", "St. Pölten", "L'Aquila", "B"]
        {
            assert!(City::new(valid).is_some(), "{valid}");
        }
        for invalid in ["", " Berlin", "Berlin ", "-Graz", "Graz\n"] {
            assert!(City::new(invalid).is_none(), "{invalid}");
        }
    }

    #[test]
    fn country_format() {
        assert!(Country::new("NL").is_some());
        assert!(Country::new("nl").is_none());
        assert!(Country::new("NLD").is_none());
        assert!(Country::new("").is_none());
    }
}
