//! [`ExpirePendingOrders`] [`Task`].

use std::{error::Error, time};

use common::operations::{By, Perform, Start};
use derive_more::{Display, Error as StdError};
use smart_default::SmartDefault;
use tokio::time::{interval, MissedTickBehavior};
use tracerr::Traced;
use tracing as log;

use crate::{command, Command, Service};
#[cfg(doc)]
use crate::domain::Order;

use super::Task;

/// Configuration for [`ExpirePendingOrders`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between sweeps.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,

    /// Age after which a pending [`Order`] is considered expired.
    #[default(time::Duration::from_secs(3 * 24 * 60 * 60))]
    pub threshold: time::Duration,
}

/// [`Task`] for cancelling pending [`Order`]s nobody submitted a truck for.
#[derive(Clone, Copy, Debug)]
pub struct ExpirePendingOrders<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpirePendingOrders<Self>, Config>>> for Service<Db>
where
    ExpirePendingOrders<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = StartError;

    async fn execute(
        &self,
        Start(by): Start<By<ExpirePendingOrders<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        if config.interval.is_zero() {
            return Err(StartError::ZeroInterval);
        }

        let task = ExpirePendingOrders {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => log::debug!("no expired pending `Order`s"),
                Ok(n) => log::info!("cancelled {n} expired pending `Order`s"),
                Err(e) => {
                    log::error!("`task::ExpirePendingOrders` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ExpirePendingOrders<Service<Db>>
where
    Service<Db>: Command<
        command::ExpirePendingOrders,
        Ok = usize,
        Err = Traced<command::expire_pending_orders::ExecutionError>,
    >,
{
    type Ok = usize;
    type Err = Traced<command::expire_pending_orders::ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .execute(command::ExpirePendingOrders {
                threshold: self.config.threshold,
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of starting [`ExpirePendingOrders`] [`Task`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum StartError {
    /// [`Config::interval`] is zero, so the sweeps would never pause.
    #[display("Sweeps interval must be positive")]
    ZeroInterval,
}
