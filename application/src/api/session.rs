//! `Session` inspection.

use std::net::IpAddr;

use axum::{
    extract::{rejection::PathRejection, Path},
    Extension, Json,
};
use serde::Serialize;
use service::{
    domain::{self, session, user},
    query, Query as _,
};

use crate::{api::Data, define_error, AsError, Error, Service};

/// Record of a `Session`, without its refresh token.
#[derive(Debug, Serialize)]
pub struct Session {
    /// ID of this `Session`.
    pub id: session::Id,

    /// Email of the `User` who has logged in.
    pub email: user::Email,

    /// User agent of the client who has logged in.
    pub user_agent: String,

    /// IP address of the client who has logged in, if known.
    pub client_ip: Option<IpAddr>,

    /// Indicator whether this `Session` is blocked.
    pub is_blocked: bool,

    /// Moment this `Session` was created at.
    pub created_at: session::CreationDateTime,

    /// Moment this `Session` expires at.
    pub expires_at: session::ExpirationDateTime,
}

impl From<domain::Session> for Session {
    fn from(s: domain::Session) -> Self {
        Self {
            id: s.id,
            email: s.email,
            user_agent: s.user_agent.to_string(),
            client_ip: s.client_ip,
            is_blocked: s.is_blocked,
            created_at: s.created_at,
            expires_at: s.expires_at,
        }
    }
}

define_error! {
    enum SessionError {
        #[code = "SESSION_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Session` not found"]
        NotFound,
    }
}

/// Returns the `Session` with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `SESSION_NOT_FOUND` - no `Session` with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(otel.name = "GET /api/admin/sessions/:id"),
)]
pub async fn get(
    Extension(service): Extension<Service>,
    id: Result<Path<session::Id>, PathRejection>,
) -> Result<Json<Data<Session>>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::session::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| SessionError::NotFound.into())
        .map(|s| Json(Session::from(s).into()))
}
