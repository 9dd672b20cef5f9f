//! [`Command`] for updating a [`User`] profile.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, ProfileImage};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`User`] profile.
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateUser {
    /// ID of the [`User`] to update.
    pub user_id: user::Id,

    /// New first [`Name`] of the [`User`].
    pub first_name: Option<user::Name>,

    /// New last [`Name`] of the [`User`].
    pub last_name: Option<user::Name>,

    /// New [`Email`] of the [`User`].
    pub email: Option<user::Email>,

    /// New [`ProfileImage`] of the [`User`].
    pub profile_image: Option<user::ProfileImage>,

    /// New [`user::Role`] of the [`User`].
    pub role: Option<user::Role>,

    /// New [`user::Status`] of the [`User`].
    pub status: Option<user::Status>,
}

impl<Db> Command<UpdateUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Email>>,
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

    async fn execute(&self, cmd: UpdateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUser {
            user_id,
            first_name,
            last_name,
            email,
            profile_image,
            role,
            status,
        } = cmd;

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

        if let Some(email) = email {
            if email != user.email {
                let owner = tx
                    .execute(Select(By::<Option<User>, _>::new(email.clone())))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if owner.is_some_and(|u| u.id != user_id) {
                    return Err(tracerr::new!(E::EmailOccupied(email)));
                }
                user.email = email;
            }
        }
        if let Some(name) = first_name {
            user.first_name = name;
        }
        if let Some(name) = last_name {
            user.last_name = name;
        }
        if let Some(image) = profile_image {
            user.profile_image = Some(image);
        }
        if let Some(role) = role {
            user.role = role;
        }
        if let Some(status) = status {
            user.status = status;
        }
        user.updated_at = DateTime::now().coerce();

        if let Err(e) = tx.execute(Update(user.clone())).await {
            if e.as_ref()
                .is_unique_violation(Some(database::USER_EMAIL_CONSTRAINT))
            {
                return Err(tracerr::new!(E::EmailOccupied(user.email)));
            }
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`UpdateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// New [`Email`] is already occupied by another [`User`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture,
        domain::user,
        Command as _,
    };

    use super::{ExecutionError, UpdateUser};

    #[tokio::test]
    async fn patches_only_provided_fields() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let updated = svc
            .execute(UpdateUser {
                user_id: user.id,
                first_name: Some(user::Name::new("Jack").unwrap()),
                status: Some(user::Status::Inactive),
                ..UpdateUser::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.first_name.as_ref(), "Jack");
        assert_eq!(updated.last_name, user.last_name);
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.status, user::Status::Inactive);
        assert_eq!(updated.role, user::Role::User);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn keeps_emails_unique() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;
        _ = fixture::user(&svc, "c@d.com", "secret1", user::Role::User).await;

        let err = svc
            .execute(UpdateUser {
                user_id: user.id,
                email: Some(user::Email::new("c@d.com").unwrap()),
                ..UpdateUser::default()
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn fails_for_unknown_user() {
        let svc = fixture::service();

        let err = svc
            .execute(UpdateUser {
                user_id: user::Id::new(),
                ..UpdateUser::default()
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::UserNotExists(_)));
    }
}
