//! Logging in by [`User`] credentials.
//!
//! [`User`]: service::domain::User

use axum::{extract::rejection::JsonRejection, Extension, Json};
use axum_client_ip::InsecureClientIp;
use axum_extra::{headers, TypedHeader};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, create_user_session},
    domain::{session, token, user},
    Command as _,
};

use crate::{define_error, AsError, Error, Service};

/// Credentials of a `User` logging in.
#[derive(Debug, Deserialize)]
pub struct Request {
    /// Email of the `User`.
    pub email: user::Email,

    /// Password of the `User`.
    pub password: SecretBox<user::Password>,
}

/// Tokens of a newly created `Session`.
#[derive(Debug, Serialize)]
pub struct Response {
    /// ID of the created `Session`.
    pub session_id: session::Id,

    /// Short-lived token to authorize API calls with.
    pub access_token: token::Token,

    /// Expiration moment of the [`Response::access_token`].
    pub access_token_expires_at: token::ExpirationDateTime,

    /// Long-lived token bound to the `Session`.
    pub refresh_token: token::Token,

    /// Expiration moment of the [`Response::refresh_token`].
    pub refresh_token_expires_at: token::ExpirationDateTime,

    /// `User` who has logged in.
    pub user: User,
}

/// Public profile of the `User` who has logged in.
#[derive(Debug, Serialize)]
pub struct User {
    /// Email of the `User`.
    pub email: user::Email,

    /// First name of the `User`.
    pub first_name: user::Name,

    /// Last name of the `User`.
    pub last_name: user::Name,

    /// Profile image of the `User`, if any.
    pub profile_image: Option<user::ProfileImage>,

    /// Moment of the last password change.
    pub password_changed_at: user::PasswordChangeDateTime,

    /// Moment the `User` was created at.
    pub created_at: user::CreationDateTime,
}

impl From<create_user_session::Output> for Response {
    fn from(out: create_user_session::Output) -> Self {
        let create_user_session::Output {
            session,
            access_token,
            access_payload,
            refresh_token,
            refresh_payload,
            user,
        } = out;

        Self {
            session_id: session.id,
            access_token,
            access_token_expires_at: access_payload.expires_at,
            refresh_token,
            refresh_token_expires_at: refresh_payload.expires_at,
            user: User {
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                profile_image: user.profile_image,
                password_changed_at: user.password_changed_at,
                created_at: user.created_at,
            },
        }
    }
}

/// Creates a new `Session` for the `User` with the provided credentials.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - malformed body or invalid email/password;
/// - `WRONG_CREDENTIALS` - credentials don't match any `User`.
#[tracing::instrument(
    skip_all,
    fields(
        email = tracing::field::Empty,
        otel.name = "POST /api/login",
    ),
)]
pub async fn login(
    Extension(service): Extension<Service>,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    client_ip: Option<InsecureClientIp>,
    body: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let Json(Request { email, password }) =
        body.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("email", tracing::field::display(&email));

    service
        .execute(command::CreateUserSession {
            email,
            password,
            user_agent: user_agent
                .map(|TypedHeader(ua)| session::UserAgent::new(ua.as_str()))
                .unwrap_or_default(),
            client_ip: client_ip.map(|InsecureClientIp(ip)| ip),
        })
        .await
        .map(|out| Json(out.into()))
        .map_err(AsError::into_error)
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Wrong credentials"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHash(_) | Self::TokenIssue(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}
