//! [`Session`] definitions.

use std::{net::IpAddr, str::FromStr};

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::{token, user};

/// Login session of a [`User`], backing its refresh [`token::Token`].
///
/// Created once per successful login and never modified afterwards.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of this [`Session`].
    pub id: Id,

    /// Email of the [`User`] this [`Session`] belongs to.
    pub email: user::Email,

    /// Refresh [`token::Token`] issued along with this [`Session`].
    pub refresh_token: token::Token,

    /// [`UserAgent`] of the client which has logged in.
    pub user_agent: UserAgent,

    /// IP address of the client which has logged in, if known.
    pub client_ip: Option<IpAddr>,

    /// Indicator whether this [`Session`] is blocked.
    ///
    /// Always `false` for new [`Session`]s and not checked anywhere yet.
    pub is_blocked: bool,

    /// [`DateTime`] when this [`Session`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Session`] expires, matching the expiration of
    /// its refresh [`token::Token`].
    pub expires_at: ExpirationDateTime,
}

/// ID of a [`Session`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|_| "invalid `session::Id`")
    }
}

/// `User-Agent` reported by a client, possibly empty.
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct UserAgent(String);

impl UserAgent {
    /// Maximal length of a stored [`UserAgent`] in bytes.
    pub const MAX_LEN: usize = 512;

    /// Creates a new [`UserAgent`], truncating it to [`UserAgent::MAX_LEN`].
    #[must_use]
    pub fn new(agent: impl Into<String>) -> Self {
        let mut agent = agent.into();
        if agent.len() > Self::MAX_LEN {
            let mut end = Self::MAX_LEN;
            while !agent.is_char_boundary(end) {
                end -= 1;
            }
            agent.truncate(end);
        }
        Self(agent)
    }
}

/// [`DateTime`] when a [`Session`] was created.
pub type CreationDateTime = DateTimeOf<(Session, unit::Creation)>;

/// [`DateTime`] when a [`Session`] expires.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::{Id, UserAgent};

    #[test]
    fn truncates_long_user_agent() {
        let agent = UserAgent::new("ж".repeat(UserAgent::MAX_LEN));

        assert!(agent.as_ref().len() <= UserAgent::MAX_LEN);
        assert!(agent.as_ref().chars().all(|c| c == 'ж'));
        assert_eq!(UserAgent::new("curl/8.0").as_ref(), "curl/8.0");
    }

    #[test]
    fn parses_id() {
        let id = Id::new();

        assert_eq!(id.to_string().parse::<Id>().unwrap(), id);
        assert!("nope".parse::<Id>().is_err());
    }
}
