//! [`Command`] for updating a [`user::Password`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Password;
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`user::Password`] by an administrator.
#[derive(Clone, Debug)]
pub struct UpdateUserPassword {
    /// ID of the [`User`] which [`Password`] should be updated.
    pub user_id: user::Id,

    /// New [`Password`] of the [`User`].
    pub password: SecretBox<user::Password>,

    /// Repeated new [`Password`], which must be the same.
    pub confirmation: SecretBox<user::Password>,
}

impl<Db> Command<UpdateUserPassword> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateUserPassword,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUserPassword {
            user_id,
            password,
            confirmation,
        } = cmd;

        if password.expose_secret() != confirmation.expose_secret() {
            return Err(tracerr::new!(E::PasswordsMismatch));
        }

        let password_hash = user::PasswordHash::new_blocking(password)
            .await
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        user.password_hash = password_hash;
        user.password_changed_at = now.coerce();
        user.updated_at = now.coerce();
        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`UpdateUserPassword`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Password`] hashing failed.
    #[display("Failed to hash password: {_0}")]
    #[from]
    PasswordHash(user::password::HashingError),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// New [`Password`] and its confirmation differ.
    #[display("Passwords do not match")]
    PasswordsMismatch,
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

    use super::{ExecutionError, UpdateUserPassword};

    #[tokio::test]
    async fn rehashes_password() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let updated = svc
            .execute(UpdateUserPassword {
                user_id: user.id,
                password: fixture::secret("secret2"),
                confirmation: fixture::secret("secret2"),
            })
            .await
            .unwrap();

        assert!(updated
            .password_hash
            .verify(&user::Password::new("secret2").unwrap())
            .unwrap());
        assert!(!updated
            .password_hash
            .verify(&user::Password::new("secret1").unwrap())
            .unwrap());
        assert!(updated.password_changed_at >= user.password_changed_at);
    }

    #[tokio::test]
    async fn rejects_mismatched_confirmation() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let err = svc
            .execute(UpdateUserPassword {
                user_id: user.id,
                password: fixture::secret("secret2"),
                confirmation: fixture::secret("secret3"),
            })
            .await
            .unwrap_err()
            .into_inner();
        assert!(matches!(err, ExecutionError::PasswordsMismatch));

        let stored = svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(user.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn fails_for_unknown_user() {
        let svc = fixture::service();

        let err = svc
            .execute(UpdateUserPassword {
                user_id: user::Id::new(),
                password: fixture::secret("secret2"),
                confirmation: fixture::secret("secret2"),
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::UserNotExists(_)));
    }
}
