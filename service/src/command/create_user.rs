//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, ProfileImage};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// First [`Name`] of a new [`User`].
    pub first_name: user::Name,

    /// Last [`Name`] of a new [`User`].
    pub last_name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`user::Role`] of a new [`User`].
    pub role: user::Role,

    /// [`user::Status`] of a new [`User`].
    pub status: user::Status,

    /// [`ProfileImage`] of a new [`User`], if any.
    pub profile_image: Option<user::ProfileImage>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            first_name,
            last_name,
            email,
            password,
            role,
            status,
            profile_image,
        } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(email.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let password_hash = user::PasswordHash::new_blocking(password)
            .await
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            email,
            password_hash,
            first_name,
            last_name,
            role,
            status,
            profile_image,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            password_changed_at: now.coerce(),
        };

        // Concurrent creation may pass the check above.
        if let Err(e) = self.database().execute(Insert(user.clone())).await {
            if e.as_ref()
                .is_unique_violation(Some(database::USER_EMAIL_CONSTRAINT))
            {
                return Err(tracerr::new!(E::EmailOccupied(user.email)));
            }
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
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

    /// [`Email`] is already occupied by another [`User`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}
