//! Authentication of HTTP requests.

use axum::{async_trait, extract::FromRequestParts};
use service::{
    command::{self, Command as _},
    domain::token,
};

use crate::{define_error, AsError, Error, Service};

/// Authenticated caller of the API, identified by a valid access
/// [`token::Token`] in the `Authorization: Bearer <token>` header.
#[derive(Clone, Debug)]
pub struct Caller(pub token::Payload);

impl Caller {
    /// Extracts the access [`token::Token`] from the provided
    /// `Authorization` header value.
    fn bearer_token(headers: &http::HeaderMap) -> Result<token::Token, Error> {
        let header = headers
            .get(http::header::AUTHORIZATION)
            .ok_or(AuthError::AuthorizationRequired)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthorizationHeader)?;

        let mut fields = header.split_whitespace();
        let (Some(scheme), Some(token)) = (fields.next(), fields.next()) else {
            return Err(AuthError::InvalidAuthorizationHeader.into());
        };
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::UnsupportedAuthorizationType.into());
        }

        Ok(token.to_owned().into())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let token = Self::bearer_token(&parts.headers)?;

        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        service
            .execute(command::AuthorizeAccessToken { token })
            .await
            .map(Self)
            .map_err(AsError::into_error)
    }
}

/// [`Caller`] having administrator rights.
#[derive(Clone, Debug)]
pub struct Admin(pub token::Payload);

#[async_trait]
impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Caller(payload) = Caller::from_request_parts(parts, state).await?;
        if !payload.claims.role.is_admin() {
            return Err(AuthError::AdminRequired.into());
        }
        Ok(Self(payload))
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization header is not provided"]
        AuthorizationRequired,

        #[code = "INVALID_AUTHORIZATION_HEADER"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid authorization header format"]
        InvalidAuthorizationHeader,

        #[code = "UNSUPPORTED_AUTHORIZATION_TYPE"]
        #[status = UNAUTHORIZED]
        #[message = "Unsupported authorization type"]
        UnsupportedAuthorizationType,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid token"]
        InvalidToken,

        #[code = "TOKEN_EXPIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Token has expired"]
        TokenExpired,

        #[code = "ADMIN_REQUIRED"]
        #[status = FORBIDDEN]
        #[message = "Administrator rights are required"]
        AdminRequired,
    }
}

impl AsError for command::authorize_access_token::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::InvalidToken(_) => Some(AuthError::InvalidToken.into()),
            Self::TokenExpired => Some(AuthError::TokenExpired.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{AuthError, Caller};

    fn headers(auth: &str) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        drop(headers.insert(
            http::header::AUTHORIZATION,
            auth.parse().unwrap(),
        ));
        headers
    }

    fn code(e: AuthError) -> &'static str {
        crate::Error::from(e).code
    }

    #[test]
    fn extracts_bearer_token() {
        let token = Caller::bearer_token(&headers("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token.as_ref(), "abc.def.ghi");

        let token = Caller::bearer_token(&headers("bearer xyz")).unwrap();
        assert_eq!(token.as_ref(), "xyz");
    }

    #[test]
    fn distinguishes_header_problems() {
        let err = Caller::bearer_token(&http::HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, code(AuthError::AuthorizationRequired));

        let err = Caller::bearer_token(&headers("Bearer")).unwrap_err();
        assert_eq!(err.code, code(AuthError::InvalidAuthorizationHeader));

        let err = Caller::bearer_token(&headers("Basic dXNlcjpwYXNz"))
            .unwrap_err();
        assert_eq!(err.code, code(AuthError::UnsupportedAuthorizationType));
    }
}
