//! Builders of entities for tests.

use std::{sync::LazyLock, time::Duration};

use common::{DateTime, Price};

use crate::{
    domain::{
        carrier, company, contract, destination, order, Contract, Destination,
        Order,
    },
    infra::Memory,
    Config, Service,
};

/// Single day.
pub(crate) const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Moment all the [`window()`]s are counted from, so the ones built in
/// the same test are comparable.
static ANCHOR: LazyLock<DateTime> = LazyLock::new(DateTime::now);

/// Parses a [`Price`].
pub(crate) fn price(s: &str) -> Price {
    s.parse().unwrap()
}

/// [`Contract`] of a new carrier, active for a year.
pub(crate) fn contract(number: &str) -> Contract {
    let now = DateTime::now();
    Contract {
        id: contract::Id::new(),
        number: contract::Number::new(number).unwrap(),
        carrier_id: carrier::Id::new(),
        fuel_price: price("1.50"),
        value: price("10000"),
        created_at: now.coerce(),
        expires_at: (now + 365 * DAY).coerce(),
    }
}

/// [`Destination`] served under the provided [`Contract`].
pub(crate) fn destination(contract: &Contract, city: &str) -> Destination {
    Destination {
        id: destination::Id::new(),
        contract_id: contract.id,
        city: destination::City::new(city).unwrap(),
        country: destination::Country::new("NL").unwrap(),
        base_price: price("150"),
        contract_fuel_price: contract.fuel_price,
        created_at: DateTime::now().coerce(),
    }
}

/// [`order::LoadingWindow`] starting in `from_days` and lasting till
/// `to_days` from the test start.
pub(crate) fn window(from_days: u32, to_days: u32) -> order::LoadingWindow {
    order::LoadingWindow::new(
        (*ANCHOR + from_days * DAY).coerce(),
        (*ANCHOR + to_days * DAY).coerce(),
    )
    .unwrap()
}

/// Pending [`Order`] of a new carrier.
pub(crate) fn order() -> Order {
    Order::new(
        company::Id::new(),
        carrier::Id::new(),
        destination::Id::new(),
        window(1, 2),
        price("1.50"),
    )
}

/// [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    let (service, _) = Service::new(Config::default(), Memory::new());
    service
}
