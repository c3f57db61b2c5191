//! Background [`Task`]s definitions.

mod background;
pub mod expire_pending_orders;

pub use common::Handler as Task;

pub use self::{
    background::Background, expire_pending_orders::ExpirePendingOrders,
};
