//! [`Command`] for creating a [`Session`].

use std::net::IpAddr;

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{
    token::Issuer,
    user::{Email, Password},
};
use crate::{
    domain::{session, token, user, Session, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] by [`User`] credentials (logging
/// in).
#[derive(Clone, Debug)]
pub struct CreateUserSession {
    /// [`Email`] of the [`User`].
    pub email: user::Email,

    /// [`Password`] of the [`User`].
    pub password: SecretBox<user::Password>,

    /// [`session::UserAgent`] of the client logging in.
    pub user_agent: session::UserAgent,

    /// IP address of the client logging in, if known.
    pub client_ip: Option<IpAddr>,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Session`].
    pub session: Session,

    /// Short-lived access [`token::Token`].
    pub access_token: token::Token,

    /// [`token::Payload`] of the [`Output::access_token`].
    pub access_payload: token::Payload,

    /// Long-lived refresh [`token::Token`], stored in the [`Session`].
    pub refresh_token: token::Token,

    /// [`token::Payload`] of the [`Output::refresh_token`].
    pub refresh_payload: token::Payload,

    /// [`User`] who has logged in.
    pub user: User,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Session>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession {
            email,
            password,
            user_agent,
            client_ip,
        } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(email.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| {
                log::debug!(%email, "login attempt for unknown email");
                E::UserNotExists(email)
            })
            .map_err(tracerr::wrap!())?;

        let matches = user
            .password_hash
            .verify_blocking(password)
            .await
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if !matches {
            log::debug!(user.id = %user.id, "login with wrong password");
            return Err(tracerr::new!(E::WrongCredentials));
        }

        let conf = self.config();
        let claims = token::Claims::from(&user);
        let (access_token, access_payload) = conf
            .token_issuer
            .issue(claims.clone(), conf.access_token_ttl)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let (refresh_token, refresh_payload) = conf
            .token_issuer
            .issue(claims, conf.refresh_token_ttl)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let session = Session {
            id: session::Id::new(),
            email: user.email.clone(),
            refresh_token: refresh_token.clone(),
            user_agent,
            client_ip,
            is_blocked: false,
            created_at: DateTime::now().coerce(),
            expires_at: refresh_payload.expires_at.coerce(),
        };
        self.database()
            .execute(Insert(session.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        log::info!(
            session.id = %session.id,
            user.id = %user.id,
            "`Session` created"
        );

        Ok(Output {
            session,
            access_token,
            access_payload,
            refresh_token,
            refresh_payload,
            user,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Stored [`user::PasswordHash`] cannot be checked.
    #[display("Failed to verify password: {_0}")]
    #[from]
    PasswordHash(user::password::HashingError),

    /// [`Issuer`] failed to sign a [`token::Token`].
    #[display("Failed to issue token: {_0}")]
    #[from]
    TokenIssue(token::IssueError),

    /// [`User`] with the provided [`Email`] does not exist.
    #[display("`User(email: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Email),

    /// Provided [`Password`] doesn't match.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use std::net::{IpAddr, Ipv4Addr};

    use common::operations::{By, Select};

    use crate::{
        command::fixture,
        domain::{session, token, user},
        infra::Database as _,
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    fn login(email: &str, password: &str) -> CreateUserSession {
        CreateUserSession {
            email: user::Email::new(email).unwrap(),
            password: fixture::secret(password),
            user_agent: session::UserAgent::new("Mozilla/5.0"),
            client_ip: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        }
    }

    #[tokio::test]
    async fn issues_tokens_and_persists_session() {
        let svc = fixture::service();
        let user =
            fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let out = svc.execute(login("a@b.com", "secret1")).await.unwrap();

        assert_eq!(out.user.id, user.id);
        assert_eq!(out.session.email, user.email);
        assert_eq!(out.session.refresh_token, out.refresh_token);
        let refresh_expires_at: session::ExpirationDateTime =
            out.refresh_payload.expires_at.coerce();
        assert_eq!(out.session.expires_at, refresh_expires_at);
        assert!(!out.session.is_blocked);
        assert_eq!(out.session.user_agent.as_ref(), "Mozilla/5.0");

        let issued_at: token::ExpirationDateTime =
            out.access_payload.issued_at.coerce();
        assert_eq!(
            out.access_payload.expires_at - issued_at,
            svc.config().access_token_ttl,
        );
        let issued_at: token::ExpirationDateTime =
            out.refresh_payload.issued_at.coerce();
        assert_eq!(
            out.refresh_payload.expires_at - issued_at,
            svc.config().refresh_token_ttl,
        );

        let issuer = &svc.config().token_issuer;
        assert_eq!(
            issuer.verify(&out.access_token).unwrap(),
            out.access_payload,
        );
        assert_eq!(
            issuer.verify(&out.refresh_token).unwrap().claims.email,
            user.email,
        );

        let stored = svc
            .database()
            .execute(Select(By::<Option<session::Session>, _>::new(
                out.session.id,
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.refresh_token, out.refresh_token);
    }

    #[tokio::test]
    async fn creates_session_per_login() {
        let svc = fixture::service();
        _ = fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let first = svc.execute(login("a@b.com", "secret1")).await.unwrap();
        let second = svc.execute(login("a@b.com", "secret1")).await.unwrap();

        assert_ne!(first.session.id, second.session.id);
        assert_eq!(svc.database().sessions().await.len(), 2);
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let svc = fixture::service();
        _ = fixture::user(&svc, "a@b.com", "secret1", user::Role::User).await;

        let err = svc
            .execute(login("a@b.com", "secret2"))
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::WrongCredentials));
        assert!(svc.database().sessions().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_email() {
        let svc = fixture::service();

        let err = svc
            .execute(login("nobody@b.com", "secret1"))
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::UserNotExists(_)));
        assert!(svc.database().sessions().await.is_empty());
    }
}
