//! [`Query`] collection related to [`Contract`]s.

use common::operations::By;

use crate::{
    domain::{carrier, contract, Contract},
    read::contract::Active,
};
#[cfg(doc)]
use crate::Query;

use super::Lookup;

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = Lookup<By<Option<Contract>, contract::Id>>;

/// Queries a [`Contract`] by its [`contract::Number`].
pub type ByNumber = Lookup<By<Option<Contract>, contract::Number>>;

/// Queries [`Active`] [`Contract`]s of a carrier, the longest lasting first.
pub type OfCarrier = Lookup<By<Vec<Active<Contract>>, carrier::Id>>;

/// Queries [`Active`] [`Contract`]s expiring no later than the provided
/// [`contract::ExpirationDateTime`], the soonest expiring first.
pub type ExpiringUntil =
    Lookup<By<Vec<Active<Contract>>, contract::ExpirationDateTime>>;
