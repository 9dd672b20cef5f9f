//! [`Password`] and its one-way [`PasswordHash`].

use std::str::FromStr;

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use derive_more::{Display, Error, From};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use secrecy::{zeroize::Zeroize, CloneableSecret, ExposeSecret as _, SecretBox};
use serde::Deserialize;
use tokio::task;

/// Password of a [`User`].
///
/// [`User`]: super::User
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct Password(String);

impl Password {
    /// Minimal length of a [`Password`] in bytes.
    pub const MIN_LEN: usize = 6;

    /// Maximal length of a [`Password`] in bytes.
    pub const MAX_LEN: usize = 128;

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let len = password.as_ref().len();
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&len)
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl TryFrom<String> for Password {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Argon2id digest of a [`Password`] in the [PHC string format].
///
/// [PHC string format]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Fixed work factor of the hashing: 19 MiB of memory, 2 iterations,
    /// 1 degree of parallelism.
    const PARAMS: Params = Params::DEFAULT;

    /// Returns the hasher used for producing new [`PasswordHash`]es.
    fn hasher() -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, Self::PARAMS)
    }

    /// Hashes the provided [`Password`] with a random salt.
    ///
    /// Hashing is CPU-intensive, so prefer
    /// [`PasswordHash::new_blocking()`] in asynchronous code.
    ///
    /// # Errors
    ///
    /// If the hasher fails to produce a digest, which may only happen on
    /// entropy or allocation failure.
    pub fn new(password: &Password) -> Result<Self, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        Self::hasher()
            .hash_password(password.0.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(HashingError::Argon2)
    }

    /// Same as [`PasswordHash::new()`], but runs on a blocking thread pool.
    ///
    /// # Errors
    ///
    /// See [`PasswordHash::new()`].
    pub async fn new_blocking(
        password: SecretBox<Password>,
    ) -> Result<Self, HashingError> {
        task::spawn_blocking(move || Self::new(password.expose_secret()))
            .await?
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// Returns `false` on mismatch. Digests are compared in constant time.
    ///
    /// # Errors
    ///
    /// If this [`PasswordHash`] is not a valid Argon2 PHC string.
    pub fn verify(&self, password: &Password) -> Result<bool, HashingError> {
        let parsed = password_hash::PasswordHash::new(&self.0)
            .map_err(HashingError::Malformed)?;
        match Argon2::default().verify_password(password.0.as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashingError::Malformed(e)),
        }
    }

    /// Same as [`PasswordHash::verify()`], but runs on a blocking thread
    /// pool.
    ///
    /// # Errors
    ///
    /// See [`PasswordHash::verify()`].
    pub async fn verify_blocking(
        &self,
        password: SecretBox<Password>,
    ) -> Result<bool, HashingError> {
        let this = self.clone();
        task::spawn_blocking(move || this.verify(password.expose_secret()))
            .await?
    }
}

/// Error of computing or verifying a [`PasswordHash`].
#[derive(Debug, Display, Error, From)]
pub enum HashingError {
    /// Argon2 failed to produce a digest.
    #[display("Failed to hash password: {_0}")]
    #[from(ignore)]
    Argon2(#[error(not(source))] password_hash::Error),

    /// Stored digest is not a valid PHC string.
    #[display("Malformed password hash: {_0}")]
    #[from(ignore)]
    Malformed(#[error(not(source))] password_hash::Error),

    /// Blocking hashing task has been aborted.
    #[display("Password hashing task aborted: {_0}")]
    Aborted(task::JoinError),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use super::{HashingError, Password, PasswordHash};

    fn password(s: &str) -> Password {
        Password::new(s).unwrap()
    }

    #[test]
    fn validates_length() {
        assert!(Password::new("12345").is_none());
        assert!(Password::new("123456").is_some());
        assert!(Password::new("x".repeat(Password::MAX_LEN)).is_some());
        assert!(Password::new("x".repeat(Password::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn verifies_same_password() {
        let hash = PasswordHash::new(&password("secret1")).unwrap();

        assert!(hash.verify(&password("secret1")).unwrap());
        assert!(!hash.verify(&password("secret2")).unwrap());
        assert!(!hash.verify(&password("Secret1")).unwrap());
    }

    #[test]
    fn salts_every_hash() {
        let first = PasswordHash::new(&password("secret1")).unwrap();
        let second = PasswordHash::new(&password("secret1")).unwrap();

        assert_ne!(first, second);
        assert!(first.verify(&password("secret1")).unwrap());
        assert!(second.verify(&password("secret1")).unwrap());
    }

    #[test]
    fn uses_argon2id() {
        let hash = PasswordHash::new(&password("secret1")).unwrap();

        assert!(hash.to_string().starts_with("$argon2id$v=19$"));
    }

    #[test]
    fn errors_on_malformed_hash() {
        let hash = PasswordHash("not a phc string".into());

        assert!(matches!(
            hash.verify(&password("secret1")),
            Err(HashingError::Malformed(_)),
        ));
    }

    #[tokio::test]
    async fn hashes_on_blocking_pool() {
        let hash = PasswordHash::new_blocking(SecretBox::init_with(|| {
            password("secret1")
        }))
        .await
        .unwrap();

        assert!(hash
            .verify_blocking(SecretBox::init_with(|| password("secret1")))
            .await
            .unwrap());
        assert!(!hash
            .verify_blocking(SecretBox::init_with(|| password("nope-nope")))
            .await
            .unwrap());
    }
}
