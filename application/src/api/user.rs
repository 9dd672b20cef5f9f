//! [`User`] directory administration.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Extension, Json,
};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, user},
    query, Query as _,
};

use crate::{api::Data, define_error, AsError, Error, Service};

/// `User` as seen by administrators.
#[derive(Debug, Serialize)]
pub struct User {
    /// ID of this `User`.
    pub id: user::Id,

    /// Email of this `User`.
    pub email: user::Email,

    /// First name of this `User`.
    pub first_name: user::Name,

    /// Last name of this `User`.
    pub last_name: user::Name,

    /// Role of this `User`.
    pub role: user::Role,

    /// Status of this `User`.
    pub status: user::Status,

    /// Profile image of this `User`, if any.
    pub profile_image: Option<user::ProfileImage>,

    /// Moment this `User` was created at.
    pub created_at: user::CreationDateTime,

    /// Moment this `User` was modified at last.
    pub updated_at: user::ModificationDateTime,

    /// Moment the password of this `User` was changed at last.
    pub password_changed_at: user::PasswordChangeDateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        let domain::User {
            id,
            email,
            password_hash: _,
            first_name,
            last_name,
            role,
            status,
            profile_image,
            created_at,
            updated_at,
            password_changed_at,
        } = user;

        Self {
            id,
            email,
            first_name,
            last_name,
            role,
            status,
            profile_image,
            created_at,
            updated_at,
            password_changed_at,
        }
    }
}

/// Body of a `User` creation request.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// First name of a new `User`.
    pub first_name: user::Name,

    /// Last name of a new `User`.
    pub last_name: user::Name,

    /// Email of a new `User`.
    pub email: user::Email,

    /// Password of a new `User`.
    pub password: SecretBox<user::Password>,

    /// Profile image of a new `User`.
    #[serde(default)]
    pub profile_image: Option<user::ProfileImage>,

    /// Role of a new `User`, [`user::Role::User`] by default.
    #[serde(default, alias = "type")]
    pub role: Option<user::Role>,

    /// Status of a new `User`, [`user::Status::Active`] by default.
    #[serde(default)]
    pub status: Option<user::Status>,
}

/// Result of a `User` creation.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Created {
    /// ID of the created `User`.
    pub user_id: user::Id,
}

/// Body of a `User` update request. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    /// New first name of the `User`.
    pub first_name: Option<user::Name>,

    /// New last name of the `User`.
    pub last_name: Option<user::Name>,

    /// New email of the `User`.
    pub email: Option<user::Email>,

    /// New profile image of the `User`.
    pub profile_image: Option<user::ProfileImage>,

    /// New role of the `User`.
    #[serde(alias = "type")]
    pub role: Option<user::Role>,

    /// New status of the `User`.
    pub status: Option<user::Status>,
}

/// Body of a password change request.
#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    /// New password.
    pub password: SecretBox<user::Password>,

    /// Repeated new password.
    pub password_confirmation: SecretBox<user::Password>,
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`User` not found"]
        NotFound,

        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Email is occupied by another `User`"]
        EmailOccupied,

        #[code = "PASSWORDS_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Password and its confirmation do not match"]
        PasswordsMismatch,
    }
}

/// Lists all `User`s ordered by their creation.
#[tracing::instrument(skip_all, fields(otel.name = "GET /api/admin/users"))]
pub async fn list(
    Extension(service): Extension<Service>,
) -> Result<Json<Data<Vec<User>>>, Error> {
    let users = service
        .execute(query::users::All::by(()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Data::from(
        users.into_iter().map(User::from).collect::<Vec<_>>(),
    )))
}

/// Creates a new `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - malformed body or invalid fields;
/// - `EMAIL_OCCUPIED` - email is used by another `User`.
#[tracing::instrument(skip_all, fields(otel.name = "POST /api/admin/users"))]
pub async fn create(
    Extension(service): Extension<Service>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<Data<Created>>, Error> {
    let Json(req) = body.map_err(AsError::into_error)?;

    let user = service
        .execute(command::CreateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
            role: req.role.unwrap_or(user::Role::User),
            status: req.status.unwrap_or(user::Status::Active),
            profile_image: req.profile_image,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Created { user_id: user.id }.into()))
}

/// Returns the `User` with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND` - no `User` with the provided ID.
#[tracing::instrument(skip_all, fields(otel.name = "GET /api/admin/users/:id"))]
pub async fn get(
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<Data<User>>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::user::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| UserError::NotFound.into())
        .map(|u| Json(User::from(u).into()))
}

/// Returns the `User` with the provided email.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND` - no `User` with the provided email.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "GET /api/admin/users/email/:email"),
)]
pub async fn get_by_email(
    Extension(service): Extension<Service>,
    email: Result<Path<user::Email>, PathRejection>,
) -> Result<Json<Data<User>>, Error> {
    let Path(email) = email.map_err(AsError::into_error)?;

    service
        .execute(query::user::ByEmail::by(email))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| UserError::NotFound.into())
        .map(|u| Json(User::from(u).into()))
}

/// Updates the provided fields of the `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - malformed body or invalid fields;
/// - `USER_NOT_FOUND` - no `User` with the provided ID;
/// - `EMAIL_OCCUPIED` - new email is used by another `User`.
#[tracing::instrument(skip_all, fields(otel.name = "PUT /api/admin/users/:id"))]
pub async fn update(
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Data<User>>, Error> {
    let Path(user_id) = id.map_err(AsError::into_error)?;
    let Json(req) = body.map_err(AsError::into_error)?;

    service
        .execute(command::UpdateUser {
            user_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            profile_image: req.profile_image,
            role: req.role,
            status: req.status,
        })
        .await
        .map(|u| Json(User::from(u).into()))
        .map_err(AsError::into_error)
}

/// Deletes the `User` permanently.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND` - no `User` with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "DELETE /api/admin/users/:id"),
)]
pub async fn delete(
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<Data<()>>, Error> {
    let Path(user_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::DeleteUser { user_id })
        .await
        .map(|()| Json(().into()))
        .map_err(AsError::into_error)
}

/// Replaces the password of the `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - malformed body or invalid password;
/// - `PASSWORDS_MISMATCH` - confirmation differs from the password;
/// - `USER_NOT_FOUND` - no `User` with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "POST /api/admin/users/:id/password"),
)]
pub async fn change_password(
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
    body: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<Data<()>>, Error> {
    let Path(user_id) = id.map_err(AsError::into_error)?;
    let Json(req) = body.map_err(AsError::into_error)?;

    service
        .execute(command::UpdateUserPassword {
            user_id,
            password: req.password,
            confirmation: req.password_confirmation,
        })
        .await
        .map(|_| Json(().into()))
        .map_err(AsError::into_error)
}

/// Grants superadmin rights to the `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND` - no `User` with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "POST /api/admin/users/:id/set-superadmin"),
)]
pub async fn set_superadmin(
    service: Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<Data<User>>, Error> {
    set_admin(service, id, true).await
}

/// Revokes superadmin rights from the `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND` - no `User` with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "POST /api/admin/users/:id/unset-superadmin"),
)]
pub async fn unset_superadmin(
    service: Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<Data<User>>, Error> {
    set_admin(service, id, false).await
}

/// Executes [`command::SetUserAdmin`] for the `User` with the provided ID.
async fn set_admin(
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
    enable: bool,
) -> Result<Json<Data<User>>, Error> {
    let Path(user_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::SetUserAdmin { user_id, enable })
        .await
        .map(|u| Json(User::from(u).into()))
        .map_err(AsError::into_error)
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHash(_) => None,
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
        }
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
        }
    }
}

impl AsError for command::update_user_password::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHash(_) => None,
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
            Self::PasswordsMismatch => {
                Some(UserError::PasswordsMismatch.into())
            }
        }
    }
}

impl AsError for command::set_user_admin::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
        }
    }
}
