//! Signed bearer [`Token`]s and their [`Issuer`].

use std::time::Duration;

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, Error, From};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// Compact [JWS] representation of a signed [`Payload`].
///
/// [JWS]: https://datatracker.ietf.org/doc/html/rfc7515
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Token(String);

/// Identity of a [`User`] carried by a [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    /// First name of the [`User`].
    pub first_name: user::Name,

    /// Last name of the [`User`].
    pub last_name: user::Name,

    /// Email of the [`User`].
    pub email: user::Email,

    /// Role of the [`User`].
    pub role: user::Role,

    /// Profile image of the [`User`], if any.
    pub profile_image: Option<user::ProfileImage>,
}

impl From<&User> for Claims {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Contents of a [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payload {
    /// Format version of this [`Payload`].
    pub version: u8,

    /// [`Claims`] of this [`Payload`].
    #[serde(flatten)]
    pub claims: Claims,

    /// When the [`Token`] has been issued.
    pub issued_at: IssuanceDateTime,

    /// When the [`Token`] stops being valid.
    pub expires_at: ExpirationDateTime,
}

impl Payload {
    /// Current format version of [`Payload`]s.
    pub const VERSION: u8 = 1;

    /// Creates a new [`Payload`] valid for the provided [`Duration`] from now.
    #[must_use]
    pub fn new(claims: Claims, duration: Duration) -> Self {
        let issued_at = IssuanceDateTime::now();
        Self {
            version: Self::VERSION,
            claims,
            issued_at,
            expires_at: (issued_at + duration).coerce(),
        }
    }

    /// Checks whether this [`Payload`] is expired already.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_elapsed()
    }
}

/// [`DateTimeOf`] a [`Payload`] issuance.
pub type IssuanceDateTime = DateTimeOf<(Payload, unit::Issuance)>;

/// [`DateTimeOf`] a [`Payload`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Payload, unit::Expiration)>;

/// Issuer and verifier of HS256-signed [`Token`]s sharing a symmetric secret.
#[derive(Clone, Debug)]
pub struct Issuer {
    /// Key signing new [`Token`]s.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key checking signatures of [`Token`]s.
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// Rules applied to incoming [`Token`]s.
    validation: Validation,
}

impl Issuer {
    /// Minimal length of a secret in bytes.
    pub const MIN_SECRET_LEN: usize = 32;

    /// Signing algorithm of [`Token`]s.
    const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates a new [`Issuer`] with the provided `secret`.
    ///
    /// # Errors
    ///
    /// If the `secret` is shorter than [`Issuer::MIN_SECRET_LEN`].
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, WeakSecretError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(WeakSecretError { len: secret.len() });
        }

        // Expiration is checked against `Payload::expires_at`, as registered
        // claims are not used.
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Issues a new [`Token`] for the provided [`Claims`], valid for the
    /// provided [`Duration`].
    ///
    /// # Errors
    ///
    /// If the [`Payload`] cannot be signed.
    pub fn issue(
        &self,
        claims: Claims,
        duration: Duration,
    ) -> Result<(Token, Payload), IssueError> {
        let payload = Payload::new(claims, duration);
        let token = self.sign(&payload)?;
        Ok((token, payload))
    }

    /// Signs the provided [`Payload`] as is.
    fn sign(&self, payload: &Payload) -> Result<Token, IssueError> {
        jsonwebtoken::encode(
            &Header::new(Self::ALGORITHM),
            payload,
            &self.encoding_key,
        )
        .map(Token)
        .map_err(IssueError)
    }

    /// Verifies the provided [`Token`] and returns its [`Payload`].
    ///
    /// Verification doesn't change any state, so verifying the same
    /// [`Token`] twice returns equal [`Payload`]s.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Invalid`] if the [`Token`] is malformed, is signed
    ///   with another algorithm or key, or has an unknown [`Payload`]
    ///   version;
    /// - [`VerifyError::Expired`] if the [`Token`] is authentic, but its
    ///   [`Payload::expires_at`] has passed.
    pub fn verify(&self, token: &Token) -> Result<Payload, VerifyError> {
        let payload = jsonwebtoken::decode::<Payload>(
            token.as_ref(),
            &self.decoding_key,
            &self.validation,
        )
        .map_err(InvalidToken::Decode)?
        .claims;

        if payload.version != Payload::VERSION {
            let version = payload.version;
            return Err(InvalidToken::UnsupportedVersion(version).into());
        }
        if payload.is_expired() {
            return Err(VerifyError::Expired);
        }

        Ok(payload)
    }
}

/// Error of creating an [`Issuer`] with a too short secret.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display(
    "Token secret must be at least {min} bytes long, but is {len}",
    min = Issuer::MIN_SECRET_LEN
)]
pub struct WeakSecretError {
    /// Length of the rejected secret in bytes.
    pub len: usize,
}

/// Error of signing a [`Payload`].
#[derive(Debug, Display, Error)]
#[display("Failed to sign a token: {_0}")]
pub struct IssueError(jsonwebtoken::errors::Error);

/// Error of [`Issuer::verify()`].
#[derive(Debug, Display, Error, From)]
pub enum VerifyError {
    /// [`Token`] is not a valid one.
    #[display("Invalid token: {_0}")]
    #[from]
    Invalid(InvalidToken),

    /// [`Token`] is authentic, but expired.
    #[display("Token has expired")]
    Expired,
}

/// Reason of a [`Token`] being invalid.
#[derive(Debug, Display, Error)]
pub enum InvalidToken {
    /// [`Token`] cannot be decoded, or its signature doesn't match.
    #[display("{_0}")]
    Decode(jsonwebtoken::errors::Error),

    /// [`Payload`] has an unknown format version.
    #[display("unsupported payload version `{_0}`")]
    UnsupportedVersion(#[error(not(source))] u8),
}
