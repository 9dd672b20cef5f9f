//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::User;

use super::DatabaseQuery;

/// Queries all the [`User`]s, oldest first.
pub type All = DatabaseQuery<By<Vec<User>, ()>>;
