//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Database configuration.
    pub database: Database,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Checks the values deserialization cannot.
    fn validated(self) -> Result<Self, ConfigError> {
        let task = self.service.tasks.expire_pending_orders;
        if task.interval.is_zero() {
            return Err(ConfigError::Message(
                "`service.tasks.expire_pending_orders.interval` must be \
                 positive"
                    .into(),
            ));
        }
        if task.threshold.is_zero() {
            return Err(ConfigError::Message(
                "`service.tasks.expire_pending_orders.threshold` must be \
                 positive"
                    .into(),
            ));
        }
        Ok(self)
    }
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Number of order events a slow subscriber may lag behind.
    #[default(1024)]
    pub events_capacity: usize,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            events_capacity,
            tasks:
                Tasks {
                    expire_pending_orders,
                },
        } = value;
        Self {
            expire_pending_orders:
                service::task::expire_pending_orders::Config {
                    interval: expire_pending_orders.interval,
                    threshold: expire_pending_orders.threshold,
                },
            events_capacity,
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpirePendingOrders` task configuration.
    pub expire_pending_orders: ExpirePendingOrders,
}

/// `ExpirePendingOrders` task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ExpirePendingOrders {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,

    /// Age after which a pending order without a truck is cancelled.
    #[default(time::Duration::from_secs(3 * 24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub threshold: time::Duration,
}

/// Database configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Database [`Backend`] to use.
    pub backend: Backend,
}

/// Database backend.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// In-memory database, losing everything on exit.
    Memory,

    /// Postgres database.
    #[default]
    Postgres,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Backend, Config};

    #[test]
    fn defaults_without_file() {
        let conf = Config::new("non-existent.toml").unwrap();

        let tasks = conf.service.tasks.expire_pending_orders;
        assert_eq!(tasks.interval, Duration::from_secs(60 * 60));
        assert_eq!(tasks.threshold, Duration::from_secs(3 * 24 * 60 * 60));
        assert_eq!(conf.database.backend, Backend::Postgres);
    }

    #[test]
    fn rejects_zero_durations() {
        let mut conf = Config::default();
        conf.service.tasks.expire_pending_orders.interval = Duration::ZERO;
        assert!(conf.validated().is_err());

        let mut conf = Config::default();
        conf.service.tasks.expire_pending_orders.threshold = Duration::ZERO;
        assert!(conf.validated().is_err());

        assert!(Config::default().validated().is_ok());
    }

    #[test]
    fn converts_into_service_config() {
        let conf = service::Config::from(super::Service::default());

        assert_eq!(conf.events_capacity, 1024);
        assert_eq!(
            conf.expire_pending_orders.threshold,
            Duration::from_secs(3 * 24 * 60 * 60),
        );
    }
}
