//! [`Config`]-related definitions.

use std::{path::PathBuf, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use service::domain::token;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: Server,

    /// Service configuration.
    #[serde(default)]
    pub service: Service,

    /// Postgres configuration.
    #[serde(default)]
    pub postgres: Postgres,

    /// Log configuration.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// Maximum duration of a single request processing.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Secret signing access and refresh tokens.
    ///
    /// Must be at least [`token::Issuer::MIN_SECRET_LEN`] bytes long.
    #[default(SecretString::from(String::new()))]
    pub token_secret: SecretString,

    /// Lifetime of an access token.
    #[default(time::Duration::from_secs(15 * 60))]
    #[serde(with = "humantime_serde")]
    pub access_token_duration: time::Duration,

    /// Lifetime of a refresh token and its `Session`.
    #[default(time::Duration::from_secs(24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub refresh_token_duration: time::Duration,
}

impl TryFrom<Service> for service::Config {
    type Error = token::WeakSecretError;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            token_secret,
            access_token_duration,
            refresh_token_duration,
        } = value;

        Ok(Self {
            token_issuer: token::Issuer::new(
                token_secret.expose_secret().as_bytes(),
            )?,
            access_token_ttl: access_token_duration,
            refresh_token_ttl: refresh_token_duration,
        })
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,

    /// File to duplicate the log into, if any.
    pub file: Option<PathBuf>,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Config, LogLevel, Service};

    #[test]
    fn defaults_without_sources() {
        let conf = Config::new("non-existent-config-file").unwrap();

        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.server.request_timeout, Duration::from_secs(30));
        assert_eq!(
            conf.service.access_token_duration,
            Duration::from_secs(15 * 60),
        );
        assert_eq!(
            conf.service.refresh_token_duration,
            Duration::from_secs(24 * 60 * 60),
        );
        assert!(matches!(conf.log.level, LogLevel::Info));
        assert!(conf.log.file.is_none());
    }

    #[test]
    fn rejects_empty_token_secret() {
        assert!(service::Config::try_from(Service::default()).is_err());
    }

    #[test]
    fn accepts_long_token_secret() {
        let conf = Service {
            token_secret: "0123456789abcdef0123456789abcdef".to_owned().into(),
            ..Service::default()
        };

        let conf = service::Config::try_from(conf).unwrap();

        assert_eq!(conf.access_token_ttl, Duration::from_secs(15 * 60));
    }
}
