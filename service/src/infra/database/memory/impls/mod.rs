//! [`Database`] implementations.
//!
//! [`Database`]: crate::infra::Database

mod contract;
mod destination;
mod fuel_price;
mod order;
