//! [`Command`] definition.

pub mod cancel_order;
pub mod create_contract;
pub mod create_destination;
pub mod create_order;
pub mod delete_order;
pub mod expire_pending_orders;
pub mod finish_order;
pub mod record_fuel_price;
pub mod renew_contract;
pub mod submit_truck;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_order::CancelOrder, create_contract::CreateContract,
    create_destination::CreateDestination, create_order::CreateOrder,
    delete_order::DeleteOrder, expire_pending_orders::ExpirePendingOrders,
    finish_order::FinishOrder, record_fuel_price::RecordFuelPrice,
    renew_contract::RenewContract, submit_truck::SubmitTruck,
};
