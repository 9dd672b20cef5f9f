//! [`Command`] for authorizing an access [`token::Token`].

use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::token::Issuer;
use crate::{domain::token, Service};

use super::Command;

/// [`Command`] for authorizing an access [`token::Token`].
///
/// Doesn't touch the [`Database`]: a [`token::Token`] is self-contained.
///
/// [`Database`]: crate::infra::Database
#[derive(Clone, Debug, From)]
pub struct AuthorizeAccessToken {
    /// [`token::Token`] to authorize.
    pub token: token::Token,
}

impl<Db> Command<AuthorizeAccessToken> for Service<Db> {
    type Ok = token::Payload;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeAccessToken,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeAccessToken { token } = cmd;

        self.config()
            .token_issuer
            .verify(&token)
            .map_err(|e| match e {
                token::VerifyError::Invalid(e) => E::InvalidToken(e),
                token::VerifyError::Expired => E::TokenExpired,
            })
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`AuthorizeAccessToken`] [`Command`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// [`token::Token`] is rejected by the [`Issuer`].
    #[display("Invalid token: {_0}")]
    InvalidToken(token::InvalidToken),

    /// [`token::Token`] has expired.
    #[display("Token has expired")]
    TokenExpired,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::{
        command::fixture,
        domain::{token, user},
        Command as _,
    };

    use super::{AuthorizeAccessToken, ExecutionError};

    fn claims() -> token::Claims {
        token::Claims {
            first_name: user::Name::new("Jane").unwrap(),
            last_name: user::Name::new("Roe").unwrap(),
            email: user::Email::new("jane@example.com").unwrap(),
            role: user::Role::User,
            profile_image: None,
        }
    }

    #[tokio::test]
    async fn returns_payload_of_valid_token() {
        let svc = fixture::service();
        let (token, payload) = svc
            .config()
            .token_issuer
            .issue(claims(), Duration::from_secs(60))
            .unwrap();

        let authorized =
            svc.execute(AuthorizeAccessToken { token }).await.unwrap();

        assert_eq!(authorized, payload);
    }

    #[tokio::test]
    async fn distinguishes_expired_token() {
        let svc = fixture::service();
        let (token, _) = svc
            .config()
            .token_issuer
            .issue(claims(), Duration::ZERO)
            .unwrap();

        let err = svc
            .execute(AuthorizeAccessToken { token })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::TokenExpired));
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let svc = fixture::service();

        let err = svc
            .execute(AuthorizeAccessToken {
                token: token::Token::from("garbage".to_owned()),
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::InvalidToken(_)));
    }
}
