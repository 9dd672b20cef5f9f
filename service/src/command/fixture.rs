//! Shared setup of [`Command`] tests.
//!
//! [`Command`]: super::Command

use std::time::Duration;

use common::{operations::Insert, DateTime};

use crate::{
    domain::{token, user, User},
    infra::{database::Memory, Database as _},
    Config, Service,
};

/// Secret used for signing tokens in tests.
pub(crate) const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

/// Creates a new [`Service`] backed by an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::new(
        Config {
            token_issuer: token::Issuer::new(SECRET).unwrap(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(24 * 60 * 60),
        },
        Memory::default(),
    )
}

/// Stores a new [`User`] with the provided `email`, `password` and
/// [`user::Role`].
pub(crate) async fn user(
    svc: &Service<Memory>,
    email: &str,
    password: &str,
    role: user::Role,
) -> User {
    let now = DateTime::now();
    let user = User {
        id: user::Id::new(),
        email: user::Email::new(email).unwrap(),
        password_hash: user::PasswordHash::new(
            &user::Password::new(password).unwrap(),
        )
        .unwrap(),
        first_name: user::Name::new("John").unwrap(),
        last_name: user::Name::new("Doe").unwrap(),
        role,
        status: user::Status::Active,
        profile_image: None,
        created_at: now.coerce(),
        updated_at: now.coerce(),
        password_changed_at: now.coerce(),
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    user
}

/// Wraps the provided `password` into a [`secrecy::SecretBox`].
pub(crate) fn secret(password: &str) -> secrecy::SecretBox<user::Password> {
    let password = user::Password::new(password).unwrap();
    secrecy::SecretBox::init_with(move || password)
}
