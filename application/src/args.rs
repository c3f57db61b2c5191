//! [`Args`] definitions.

use clap::{Parser, Subcommand};
use common::Price;
use service::domain::destination;

/// Freight order lifecycle service.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// [`Command`] to execute, [`Command::Run`] if omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Command to execute.
#[derive(Clone, Debug, Default, Subcommand)]
pub enum Command {
    /// Runs background tasks until stopped.
    #[default]
    Run,

    /// Records today's fuel price.
    RecordFuelPrice {
        /// Per-liter fuel price.
        #[arg(long)]
        price: Price,
    },

    /// Resolves the carrier offering the best price for a city.
    Resolve {
        /// City to deliver to.
        #[arg(long)]
        city: destination::City,
    },

    /// Cancels expired pending orders once.
    ExpirePendingOrders,
}
