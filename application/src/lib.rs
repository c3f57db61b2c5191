//! Application runs the [`Service`] and its background tasks.
//!
//! [`Service`]: service::Service

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod args;
pub mod config;

use std::error::Error;

use common::operations::{By, Start};
use futures::TryFutureExt as _;
use service::{
    command::{self, ExpirePendingOrders, RecordFuelPrice},
    domain::{fuel_price, pricing::Offer},
    query::{self, ResolveBestCarrier},
    task, Service, Task,
};
use tokio::sync::broadcast;
use tracerr::Traced;
use tracing as log;
// Used in binary.
use refinery as _;
use tracing_subscriber as _;

pub use self::{
    args::{Args, Command},
    config::Config,
};

/// Executes the provided [`Command`] with a [`Service`] over the provided
/// database.
///
/// # Errors
///
/// If the [`Command`] fails. The failure is logged already.
pub async fn run<Db>(
    cmd: Command,
    conf: service::Config,
    db: Db,
) -> Result<(), ()>
where
    Db: Clone + 'static,
    Service<Db>: Task<
            Start<
                By<
                    task::ExpirePendingOrders<Service<Db>>,
                    task::expire_pending_orders::Config,
                >,
            >,
            Ok = (),
            Err: Error,
        > + service::Command<
            RecordFuelPrice,
            Ok = fuel_price::Record,
            Err = Traced<command::record_fuel_price::ExecutionError>,
        > + service::Command<
            ExpirePendingOrders,
            Ok = usize,
            Err = Traced<command::expire_pending_orders::ExecutionError>,
        > + service::Query<
            ResolveBestCarrier,
            Ok = Option<Offer>,
            Err = Traced<query::resolve_best_carrier::ExecutionError>,
        >,
{
    let (service, background) = Service::new(conf, db);

    match cmd {
        Command::Run => {
            let events = service.subscribe();
            let _ = tokio::spawn(log_events(events));

            log::info!("running background tasks");
            background
                .await
                .map_err(|e| log::error!("background tasks stopped: {e}"))
        }
        Command::RecordFuelPrice { price } => service
            .execute(RecordFuelPrice { price, date: None })
            .await
            .map(|r| println!("{} on {}", r.price, r.date))
            .map_err(|e| log::error!("failed to record fuel price: {e}")),
        Command::Resolve { city } => service
            .execute(ResolveBestCarrier { city: city.clone() })
            .await
            .map(|offer| match offer {
                Some(o) => println!(
                    "`Carrier(id: {})`: {} under `Contract(id: {})`",
                    o.carrier_id, o.price, o.contract_id,
                ),
                None => println!("`{city}` is not served at the moment"),
            })
            .map_err(|e| log::error!("failed to resolve carrier: {e}")),
        Command::ExpirePendingOrders => service
            .execute(ExpirePendingOrders {
                threshold: conf.expire_pending_orders.threshold,
            })
            .map_ok(|n| println!("cancelled {n} expired pending orders"))
            .await
            .map_err(|e| log::error!("failed to expire pending orders: {e}")),
    }
}

/// Logs the [`service::domain::order::Event`]s received until the
/// [`Service`] is dropped.
async fn log_events(
    mut events: broadcast::Receiver<service::domain::order::Event>,
) {
    loop {
        match events.recv().await {
            Ok(ev) => log::debug!("{ev}"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("missed {n} order events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
