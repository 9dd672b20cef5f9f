//! HTTP API definitions.

pub mod login;
pub mod session;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::auth;

/// Successful response body wrapping its `data`.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Data<T> {
    /// Payload of the response.
    pub data: T,
}

impl<T> From<T> for Data<T> {
    fn from(data: T) -> Self {
        Self { data }
    }
}

/// Builds the [`Router`] of the whole HTTP API.
///
/// Expects a [`crate::Service`] to be provided as an [`axum::Extension`].
pub fn router() -> Router {
    let admin = Router::new()
        .route("/users", get(user::list).post(user::create))
        .route(
            "/users/:id",
            get(user::get).put(user::update).delete(user::delete),
        )
        .route("/users/:id/password", post(user::change_password))
        .route("/users/:id/set-superadmin", post(user::set_superadmin))
        .route("/users/:id/unset-superadmin", post(user::unset_superadmin))
        .route("/users/email/:email", get(user::get_by_email))
        .route("/sessions/:id", get(session::get))
        .route_layer(axum::middleware::from_extractor::<auth::Admin>());

    let api = Router::new()
        .route("/login", post(login::login))
        .nest("/admin", admin);

    Router::new().nest("/api", api)
}
