//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
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

pub mod command;
pub mod domain;
#[cfg(test)]
mod fixtures;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use common::operations::{By, Start};
use derive_more::{Debug, Error};
use smart_default::SmartDefault;
use tokio::sync::broadcast;
use tracing as log;

#[cfg(doc)]
use infra::Database;

use self::domain::order;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// [`task::ExpirePendingOrders`] configuration.
    pub expire_pending_orders: task::expire_pending_orders::Config,

    /// Number of [`order::Event`]s a slow subscriber may lag behind before
    /// missing some of them.
    #[default(1024)]
    pub events_capacity: usize,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Channel publishing [`order::Event`]s.
    events: broadcast::Sender<order::Event>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpirePendingOrders<Self>,
                        task::expire_pending_orders::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let (events, _) = broadcast::channel(config.events_capacity.max(1));
        let this = Service {
            config,
            database,
            events,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("expire_pending_orders", async move {
            svc.execute(Start(By::new(svc.config().expire_pending_orders)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Subscribes to [`order::Event`]s published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<order::Event> {
        self.events.subscribe()
    }

    /// Publishes the provided [`order::Event`] to the current subscribers.
    ///
    /// Delivery is best-effort: the [`order::Event`] is lost if nobody is
    /// subscribed.
    fn publish(&self, event: order::Event) {
        if self.events.send(event).is_err() {
            log::trace!("no subscribers for `{event}`");
        }
    }
}
