//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{get_or_try_init, impl_lazy_connection, NonTx};

/// Transactional Postgres database client.
///
/// Clones share the same transaction, which is begun on the first
/// statement.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to take a connection from, if the originating
    /// [`NonTx`] client has none.
    pool: connection::Pool,

    /// State shared between clones.
    inner: Arc<Inner>,
}

/// State shared between clones of a [`Tx`] client.
#[derive(Debug)]
pub struct Inner {
    /// [`NonTx`] client this [`Tx`] was created from, until its connection
    /// is reused.
    origin: RwLock<Option<NonTx>>,

    /// Begun [`connection::Tx`], if any.
    tx: RwLock<Option<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            inner: Arc::new(Inner {
                origin: RwLock::new(Some(client)),
                tx: RwLock::new(None),
            }),
        }
    }

    /// Returns the [`connection::Tx`] of this client, beginning it if there
    /// is none yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        get_or_try_init(&self.inner.tx, || async move {
            let origin = self.inner.origin.write().await.take();
            let reused = match origin {
                Some(client) => client.take_connection().await,
                None => None,
            };
            let conn = match reused {
                Some(conn) => conn,
                None => self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?,
            };

            connection::Tx::from_non_tx(conn)
                .await
                .map_err(tracerr::wrap!())
        })
        .await
    }

    /// Commits the transaction of this client.
    ///
    /// Does nothing if no statement has been run.
    ///
    /// # Errors
    ///
    /// If the `COMMIT` statement fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.inner.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl_lazy_connection!(Tx);
