//! [`Query`] collection related to a single [`Destination`].

use common::operations::By;

use crate::domain::{destination, Destination};
#[cfg(doc)]
use crate::Query;

use super::Lookup;

/// Queries a [`Destination`] by its [`destination::Id`].
pub type ById = Lookup<By<Option<Destination>, destination::Id>>;
