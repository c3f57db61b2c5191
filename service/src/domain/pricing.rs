//! Fuel-adjusted pricing and carrier selection.

use std::cmp::Reverse;

use common::{price::Decimal, DateTime, Price};

use crate::domain::{carrier, contract, destination, Contract, Destination};

/// Share of the relative fuel price spread passed on to a delivery price.
const FUEL_SPREAD_SHARE: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Adjusts the `base` price of a delivery by the spread between the `current`
/// fuel price and the `locked` one.
///
/// The `base` price is returned unchanged when nothing is `locked`.
#[must_use]
pub fn adjusted_price(base: Price, current: Price, locked: Price) -> Price {
    if locked.is_zero() {
        return base;
    }

    let spread = current.amount() - locked.amount();
    let factor = (spread / locked.amount()) * FUEL_SPREAD_SHARE;

    // `current` is never negative, so `factor` is bounded by `-0.3` below.
    Price::new(base.amount() * (Decimal::ONE + factor)).unwrap_or(Price::ZERO)
}

/// [`Destination`] along with the [`Contract`] it is served under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// [`Contract`] serving the [`Destination`].
    pub contract: Contract,

    /// [`Destination`] itself.
    pub destination: Destination,
}

/// Best delivery offer for a city.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Offer {
    /// ID of the carrier making this [`Offer`].
    pub carrier_id: carrier::Id,

    /// ID of the [`Contract`] this [`Offer`] is made under.
    pub contract_id: contract::Id,

    /// ID of the offered [`Destination`].
    pub destination_id: destination::Id,

    /// Fuel-adjusted price of this [`Offer`].
    pub price: Price,
}

/// Selects the best [`Offer`] among the provided [`Candidate`]s.
///
/// Only [`Candidate`]s with a [`Contract`] active at `now` are considered.
/// They are ranked by:
/// 1. [`Contract`] expiry, the later the better;
/// 2. adjusted price, the lower the better;
/// 3. [`Contract`] value, the higher the better;
/// 4. [`Contract`] number, in lexicographic order.
#[must_use]
pub fn best_offer(
    candidates: impl IntoIterator<Item = Candidate>,
    current: Price,
    now: DateTime,
) -> Option<Offer> {
    candidates
        .into_iter()
        .filter(|c| {
            c.destination.contract_id == c.contract.id
                && c.contract.is_active_at(now)
        })
        .map(|c| {
            let price = c.destination.adjusted_price(current);
            (c, price)
        })
        .min_by(|(a, a_price), (b, b_price)| {
            let key = |c: &Candidate, price| {
                (
                    Reverse(c.contract.expires_at),
                    price,
                    Reverse(c.contract.value),
                )
            };
            key(a, *a_price)
                .cmp(&key(b, *b_price))
                .then_with(|| a.contract.number.cmp(&b.contract.number))
        })
        .map(|(c, price)| Offer {
            carrier_id: c.contract.carrier_id,
            contract_id: c.contract.id,
            destination_id: c.destination.id,
            price,
        })
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{price::Decimal, DateTime, Price};

    use crate::domain::{carrier, contract, destination, Contract, Destination};

    use super::{adjusted_price, best_offer, Candidate};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn candidate(
        number: &str,
        fuel_price: &str,
        base_price: &str,
        value: &str,
        expires_at: DateTime,
    ) -> Candidate {
        let contract = Contract {
            id: contract::Id::new(),
            number: contract::Number::new(number).unwrap(),
            carrier_id: carrier::Id::new(),
            fuel_price: price(fuel_price),
            value: price(value),
            created_at: (DateTime::now() - DAY).coerce(),
            expires_at: expires_at.coerce(),
        };
        let destination = Destination {
            id: destination::Id::new(),
            contract_id: contract.id,
            city: destination::City::new("Rotterdam").unwrap(),
            country: destination::Country::new("NL").unwrap(),
            base_price: price(base_price),
            contract_fuel_price: contract.fuel_price,
            created_at: DateTime::now().coerce(),
        };
        Candidate {
            contract,
            destination,
        }
    }

    #[test]
    fn adjusts_by_fuel_spread() {
        assert_eq!(
            adjusted_price(price("100"), price("1.10"), price("1.00")),
            price("103"),
        );
        assert_eq!(
            adjusted_price(price("100"), price("0.90"), price("1.00")),
            price("97"),
        );
        assert_eq!(
            adjusted_price(price("150"), price("1.50"), price("1.50")),
            price("150"),
        );
    }

    #[test]
    fn zero_locked_price_keeps_base() {
        for current in ["0", "1.23", "999"] {
            assert_eq!(
                adjusted_price(price("150"), price(current), Price::ZERO),
                price("150"),
            );
        }
    }

    #[test]
    fn monotonic_in_current_price() {
        let base = price("148");
        for locked in ["0.01", "1.45", "3"] {
            let locked = price(locked);
            let mut prev = adjusted_price(base, Price::ZERO, locked);
            for cents in (5..=500).step_by(5) {
                let current = Price::new(Decimal::new(cents, 2)).unwrap();
                let next = adjusted_price(base, current, locked);
                assert!(next >= prev, "{next} < {prev} at {current}");
                prev = next;
            }
        }
    }

    #[test]
    fn prefers_longest_lasting_contract() {
        let now = DateTime::now();
        let a = candidate("A-1", "1.50", "150", "1000", now + 365 * DAY);
        let b = candidate("B-1", "1.45", "148", "1000", now + 2 * DAY);
        let expected = a.contract.carrier_id;

        let offer = best_offer([b, a], price("1.60"), now).unwrap();

        assert_eq!(offer.carrier_id, expected);
        let diff = offer.price.amount() - Decimal::from(153);
        assert!(diff.abs() < Decimal::new(1, 20), "{}", offer.price);
    }

    #[test]
    fn breaks_ties_by_price_then_value() {
        let now = DateTime::now();
        let expiry = now + 30 * DAY;

        let cheap = candidate("C-1", "1.50", "140", "10", expiry);
        let pricey = candidate("C-2", "1.50", "150", "99999", expiry);
        let expected = cheap.destination.id;
        let offer = best_offer([pricey, cheap], price("1.50"), now).unwrap();
        assert_eq!(offer.destination_id, expected);

        let small = candidate("D-1", "1.50", "140", "10", expiry);
        let large = candidate("D-2", "1.50", "140", "20", expiry);
        let expected = large.contract.id;
        let offer = best_offer([small, large], price("1.50"), now).unwrap();
        assert_eq!(offer.contract_id, expected);

        let second = candidate("E-2", "1.50", "140", "10", expiry);
        let first = candidate("E-1", "1.50", "140", "10", expiry);
        let expected = first.contract.id;
        let offer = best_offer([second, first], price("1.50"), now).unwrap();
        assert_eq!(offer.contract_id, expected);
    }

    #[test]
    fn ignores_expired_contracts() {
        let now = DateTime::now();
        let expired = candidate("X-1", "1.50", "1", "1", now);
        let stale = candidate("X-2", "1.50", "1", "1", now - DAY);

        assert!(best_offer([expired, stale], price("1.50"), now).is_none());
        assert!(best_offer([], price("1.50"), now).is_none());
    }

    #[test]
    fn ignores_mismatched_destinations() {
        let now = DateTime::now();
        let mut broken = candidate("M-1", "1.50", "1", "1", now + DAY);
        broken.destination.contract_id = contract::Id::new();

        assert!(best_offer([broken], price("1.50"), now).is_none());
    }
}
