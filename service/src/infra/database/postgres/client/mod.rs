//! Postgres database clients acquiring their [`Connection`]s lazily.
//!
//! [`Connection`]: super::Connection

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the value stored in the provided `slot`, filling it with the
/// `init` result first, if it's empty.
async fn get_or_try_init<T, F, Fut>(
    slot: &RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'_, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        // Another task may have filled the `slot` while we were waiting.
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |v| {
        v.as_ref().expect("cannot be emptied while guard is alive")
    }))
}

/// Implements [`Connection`] for a client by running statements on the
/// [`Connection`] returned from its `connection()` method.
///
/// [`Connection`]: super::Connection
macro_rules! impl_lazy_connection {
    ($ty:ty) => {
        impl Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}
use impl_lazy_connection;
