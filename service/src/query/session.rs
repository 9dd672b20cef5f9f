//! [`Query`] collection related to a single [`Session`].

use common::operations::By;

use crate::domain::{session, Session};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Session`] by its [`session::Id`].
pub type ById = DatabaseQuery<By<Option<Session>, session::Id>>;
