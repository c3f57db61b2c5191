//! Carrier definitions.
//!
//! Carriers (transporters) are owned by an external profile registry, so only
//! the identifiers and vehicle data referenced by orders live here.

use std::sync::LazyLock;

use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of a carrier.
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Registration plate of a carrier's truck.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Plate(String);

impl Plate {
    /// Creates a new [`Plate`] if the given `plate` is valid.
    #[must_use]
    pub fn new(plate: impl Into<String>) -> Option<Self> {
        let plate = plate.into();
        Self::check(&plate).then_some(Self(plate))
    }

    /// Checks whether the given `plate` is a valid [`Plate`].
    fn check(plate: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Plate`] format:
        /// - Must consist of uppercase latin letters, digits, spaces and
        ///   hyphens;
        /// - Must start and end with a letter or a digit;
        /// - Must be between 2 and 16 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z0-9][A-Z0-9 -]{0,14}[A-Z0-9]$")
                .expect("valid regex")
        });

        REGEX.is_match(plate.as_ref())
    }
}

impl FromStr for Plate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Plate`")
    }
}

#[cfg(test)]
mod spec {
    use super::Plate;

    #[test]
    fn plate_format() {
        for valid in ["ABC-123", "AB 1234 CD", "K7", "1234567890ABCDEF"] {
            assert!(Plate::new(valid).is_some(), "{valid}");
        }
        for invalid in [
            "",
            "A",
            "abc-123",
            "-ABC",
            "ABC-",
            " ABC",
            "ABC_123",
            "12345678901234567",
        ] {
            assert!(Plate::new(invalid).is_none(), "{invalid}");
        }
    }
}
