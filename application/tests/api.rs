//! HTTP API checks which are resolved before reaching the database.

use std::time::Duration;

use application::{api, config};
use axum::{body::Body, Extension, Router};
use serde_json::{json, Value};
use service::{
    domain::{token, user},
    infra::Postgres,
};
use tower::ServiceExt as _;

const SECRET: &[u8] = b"http-test-secret-http-test-secret";

/// Builds the API [`Router`] over a [`Postgres`] pool which never connects.
fn app() -> Router {
    let postgres =
        Postgres::new(&config::Postgres::default().into()).unwrap();
    let service = service::Service::new(
        service::Config {
            token_issuer: token::Issuer::new(SECRET).unwrap(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(24 * 60 * 60),
        },
        postgres,
    );
    api::router().layer(Extension(service))
}

fn token(role: user::Role, ttl: Duration) -> String {
    let claims = token::Claims {
        first_name: user::Name::new("Jane").unwrap(),
        last_name: user::Name::new("Roe").unwrap(),
        email: user::Email::new("jane@example.com").unwrap(),
        role,
        profile_image: None,
    };
    let (token, _) = token::Issuer::new(SECRET)
        .unwrap()
        .issue(claims, ttl)
        .unwrap();
    token.to_string()
}

async fn call(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<&str>,
) -> (http::StatusCode, Value) {
    let mut req = http::Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header(http::header::AUTHORIZATION, auth);
    }
    let req = if let Some(body) = body {
        req.header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
    } else {
        req.body(Body::empty())
    }
    .unwrap();

    let resp = app().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn rejects_missing_authorization() {
    let (status, body) = call("GET", "/api/admin/users", None, None).await;

    assert_eq!(status, http::StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": "Authorization header is not provided"}),
    );
}

#[tokio::test]
async fn distinguishes_malformed_authorization() {
    let (status, malformed) =
        call("GET", "/api/admin/users", Some("Bearer"), None).await;
    assert_eq!(status, http::StatusCode::UNAUTHORIZED);

    let (status, unsupported) =
        call("GET", "/api/admin/users", Some("Basic dXNlcjpwYXNz"), None)
            .await;
    assert_eq!(status, http::StatusCode::UNAUTHORIZED);

    let (status, invalid) =
        call("GET", "/api/admin/users", Some("Bearer abc.def.ghi"), None)
            .await;
    assert_eq!(status, http::StatusCode::UNAUTHORIZED);

    assert_ne!(malformed, unsupported);
    assert_ne!(unsupported, invalid);
    assert_ne!(malformed, invalid);
    assert_eq!(invalid, json!({"error": "Invalid token"}));
}

#[tokio::test]
async fn rejects_expired_token() {
    let auth = format!("Bearer {}", token(user::Role::Admin, Duration::ZERO));

    let (status, body) =
        call("GET", "/api/admin/users", Some(&auth), None).await;

    assert_eq!(status, http::StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Token has expired"}));
}

#[tokio::test]
async fn forbids_non_admins() {
    let auth = format!(
        "Bearer {}",
        token(user::Role::User, Duration::from_secs(60)),
    );

    let (status, body) =
        call("GET", "/api/admin/users", Some(&auth), None).await;

    assert_eq!(status, http::StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rejects_invalid_user_id() {
    let auth = format!(
        "Bearer {}",
        token(user::Role::Superadmin, Duration::from_secs(60)),
    );

    let (status, body) =
        call("GET", "/api/admin/users/not-a-uuid", Some(&auth), None).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rejects_invalid_new_user() {
    let auth = format!(
        "Bearer {}",
        token(user::Role::Admin, Duration::from_secs(60)),
    );

    let (status, body) = call(
        "POST",
        "/api/admin/users",
        Some(&auth),
        Some(
            r#"{
                "first_name": "Ann",
                "last_name": "Lee",
                "email": "not an email",
                "password": "secret1"
            }"#,
        ),
    )
    .await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rejects_malformed_login() {
    let (status, body) =
        call("POST", "/api/login", None, Some(r#"{"email": "a@b.com""#)).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rejects_short_login_password() {
    let (status, body) = call(
        "POST",
        "/api/login",
        None,
        Some(r#"{"email": "a@b.com", "password": "12345"}"#),
    )
    .await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
