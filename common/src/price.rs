//! [`Price`]-related definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
pub use rust_decimal::Decimal;

/// Non-negative decimal amount of money.
///
/// Used both for per-liter fuel prices and for per-trip or per-contract
/// amounts, all of which are denominated in EUR.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Decimal", into = "Decimal")
)]
pub struct Price(Decimal);

impl Price {
    /// Zero [`Price`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Price`] if the provided `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// Creates a new [`Price`] if the provided `amount` is strictly positive.
    #[must_use]
    pub fn positive(amount: Decimal) -> Option<Self> {
        (amount > Decimal::ZERO).then_some(Self(amount))
    }

    /// Returns the [`Decimal`] amount of this [`Price`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Price`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Price {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

impl TryFrom<Decimal> for Price {
    type Error = &'static str;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or("negative amount")
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Price {
    accepts!(NUMERIC);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Self::try_from(Decimal::from_sql(ty, raw)?).map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Price {
    accepts!(NUMERIC);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, w)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Price;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Price::from_str("1.45").unwrap().amount(),
            decimal("1.45"),
        );
        assert_eq!(Price::from_str(" 150 ").unwrap().amount(), decimal("150"));
        assert_eq!(Price::from_str("0").unwrap(), Price::ZERO);
        assert_eq!(Price::from_str("-0").unwrap(), Price::ZERO);

        assert!(Price::from_str("-1.5").is_err());
        assert!(Price::from_str("1,5").is_err());
        assert!(Price::from_str("EUR").is_err());
    }

    #[test]
    fn positive() {
        assert!(Price::positive(decimal("0.01")).is_some());
        assert!(Price::positive(Decimal::ZERO).is_none());
        assert!(Price::positive(decimal("-3")).is_none());
    }

    #[test]
    fn to_string() {
        assert_eq!(Price::from_str("148.00").unwrap().to_string(), "148");
        assert_eq!(Price::from_str("1.450").unwrap().to_string(), "1.45");
    }
}
