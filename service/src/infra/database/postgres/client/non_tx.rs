//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{get_or_try_init, impl_lazy_connection};

/// Non-transactional Postgres database client.
///
/// Takes a [`connection::NonTx`] from the [`connection::Pool`] on the first
/// statement and keeps it for the following ones.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take connections from.
    pub(crate) pool: connection::Pool,

    /// Taken [`connection::NonTx`], if any.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`connection::NonTx`] of this client, taking it from the
    /// [`connection::Pool`] if there is none yet.
    pub(crate) async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        get_or_try_init(&self.connection, || async move {
            self.pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }

    /// Detaches the [`connection::NonTx`] from this client, so it can be
    /// reused for a transaction.
    #[must_use]
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

impl_lazy_connection!(NonTx);
