//! Domain definitions.

pub mod carrier;
pub mod company;
pub mod contract;
pub mod destination;
pub mod fuel_price;
pub mod order;
pub mod pricing;
pub mod user;

pub use self::{contract::Contract, destination::Destination, order::Order};
