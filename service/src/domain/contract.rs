//! [`Contract`] definitions.

use std::sync::LazyLock;

use common::{unit, DateTime, DateTimeOf, Price};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::carrier;

/// Pricing agreement of a carrier.
///
/// Expiry is fixed at creation. Prolonging a [`Contract`] means creating a new
/// one with a [successor](RenewalPrefix::successor) [`Number`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Unique [`Number`] of this [`Contract`].
    pub number: Number,

    /// ID of the carrier owning this [`Contract`].
    pub carrier_id: carrier::Id,

    /// Per-liter fuel price locked in by this [`Contract`].
    pub fuel_price: Price,

    /// Total value of this [`Contract`] in EUR.
    pub value: Price,

    /// [`DateTime`] when this [`Contract`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Contract`] expires.
    pub expires_at: ExpirationDateTime,
}

impl Contract {
    /// Number of years a [`Contract`] is valid for, unless specified
    /// otherwise.
    pub const DEFAULT_VALIDITY_YEARS: u16 = 1;

    /// Returns whether this [`Contract`] is active at the provided moment.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime) -> bool {
        now < self.expires_at.coerce()
    }

    /// Returns whether this [`Contract`] is active now.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_at(DateTime::now())
    }
}

/// ID of a [`Contract`].
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

/// Unique number of a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] if the given `num` is valid.
    #[must_use]
    pub fn new(num: impl Into<String>) -> Option<Self> {
        let num = num.into();
        Self::check(&num).then_some(Self(num))
    }

    /// Checks whether the given `num` is a valid [`Number`].
    fn check(num: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Number`] format:
        /// - Must consist of latin letters, digits and `/._-` separators;
        /// - Must start and end with a letter or a digit;
        /// - Must be between 1 and 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9/._-]{0,62}[A-Za-z0-9])?$")
                .expect("valid regex")
        });

        REGEX.is_match(num.as_ref())
    }

    /// Returns the base part of this [`Number`], preceding its first `-`.
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(base, _)| base)
    }

    /// Returns the [`RenewalPrefix`] shared by all renewals of this
    /// [`Number`] and of its predecessors.
    #[must_use]
    pub fn renewal_prefix(&self) -> RenewalPrefix {
        RenewalPrefix(format!("{}-R", self.base()))
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Prefix of the [`Number`]s issued by renewing a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct RenewalPrefix(String);

impl RenewalPrefix {
    /// Generates the next renewal [`Number`] following the `existing` ones.
    ///
    /// The sequence is `{prefix}01`, `{prefix}02` and so on, growing past two
    /// digits when needed. [`Number`]s not following the sequence are ignored.
    #[must_use]
    pub fn successor<'n>(
        &self,
        existing: impl IntoIterator<Item = &'n Number>,
    ) -> Number {
        let last = existing
            .into_iter()
            .filter_map(|n| {
                let seq = n.0.strip_prefix(self.0.as_str())?;
                seq.bytes()
                    .all(|b| b.is_ascii_digit())
                    .then(|| seq.parse::<u64>().ok())
                    .flatten()
            })
            .max()
            .unwrap_or(0);
        Number(format!("{}{:02}", self.0, last.saturating_add(1)))
    }
}

/// [`DateTime`] when a [`Contract`] was created.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// [`DateTime`] when a [`Contract`] expires.
pub type ExpirationDateTime = DateTimeOf<(Contract, unit::Expiration)>;
