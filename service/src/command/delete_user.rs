//! [`Command`] for deleting a [`User`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`User`] permanently.
///
/// [`Session`]s of the [`User`] are kept.
///
/// [`Session`]: crate::domain::Session
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteUser {
    /// ID of the [`User`] to delete.
    pub user_id: user::Id,
}

impl<Db> Command<DeleteUser> for Service<Db>
where
    Db: Database<
        Delete<By<User, user::Id>>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUser { user_id } = cmd;

        let deleted = self
            .database()
            .execute(Delete(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !deleted {
            return Err(tracerr::new!(E::UserNotExists(user_id)));
        }

        Ok(())
    }
}

/// Error of [`DeleteUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::fixture,
        domain::{user, User},
        infra::Database as _,
        Command as _,
    };

    use super::{DeleteUser, ExecutionError};

    #[tokio::test]
    async fn deletes_existing_user_once() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        svc.execute(DeleteUser { user_id: user.id }).await.unwrap();

        assert!(svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(user.id)))
            .await
            .unwrap()
            .is_none());

        let err = svc
            .execute(DeleteUser { user_id: user.id })
            .await
            .unwrap_err()
            .into_inner();
        assert!(matches!(err, ExecutionError::UserNotExists(_)));
    }
}
