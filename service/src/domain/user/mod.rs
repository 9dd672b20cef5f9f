//! [`User`] definitions.

pub mod password;

use std::{str::FromStr, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::password::{Password, PasswordHash};

/// User of the directory.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Email`] of this [`User`], unique across the directory.
    pub email: Email,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// First [`Name`] of this [`User`].
    pub first_name: Name,

    /// Last [`Name`] of this [`User`].
    pub last_name: Name,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`Status`] of this [`User`].
    pub status: Status,

    /// [`ProfileImage`] of this [`User`], if any.
    pub profile_image: Option<ProfileImage>,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was modified the last time.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when the [`Password`] of this [`User`] was changed the
    /// last time.
    pub password_changed_at: PasswordChangeDateTime,
}

/// ID of a [`User`].
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
        Uuid::parse_str(s).map(Self).map_err(|_| "invalid `user::Id`")
    }
}

/// First or last name of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

impl TryFrom<String> for Name {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Email address of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    ///
    /// The domain part is lowercased, as it's case-insensitive.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        if !Self::check(&address) {
            return None;
        }
        let (local, domain) = address.rsplit_once('@')?;
        Some(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format: a local part
        /// without whitespace, and a dotted domain.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^[^\s@()<>\[\]\\,;:]+@[^\s@()<>\[\]\\,;:.]+(\.[^\s@()<>\[\]\\,;:.]+)+$",
            )
            .expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

impl TryFrom<String> for Email {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Reference to a profile image of a [`User`] (an URL or a storage key).
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProfileImage(String);

impl ProfileImage {
    /// Creates a new [`ProfileImage`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        let valid = !reference.is_empty()
            && reference.len() <= 2048
            && !reference.chars().any(char::is_whitespace);
        valid.then_some(Self(reference))
    }
}

impl FromStr for ProfileImage {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ProfileImage`")
    }
}

impl TryFrom<String> for ProfileImage {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `ProfileImage`")
    }
}

define_kind! {
    #[doc = "Role of a [`User`], determining its access level."]
    enum Role {
        #[doc = "Regular user."]
        User = 1,

        #[doc = "Administrator of the directory."]
        Admin = 2,

        #[doc = "Administrator who cannot be managed by other administrators."]
        Superadmin = 3,
    }
}

impl Role {
    /// Checks whether this [`Role`] grants access to the administration API.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

define_kind! {
    #[doc = "Status of a [`User`] account."]
    enum Status {
        #[doc = "Account is in use."]
        Active = 1,

        #[doc = "Account is switched off."]
        Inactive = 2,
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was modified.
pub type ModificationDateTime = DateTimeOf<(User, unit::Modification)>;

/// [`DateTime`] when a [`User`] changed its [`Password`].
pub type PasswordChangeDateTime = DateTimeOf<(User, Password)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, ProfileImage, Role, Status};

    #[test]
    fn validates_email() {
        assert!(Email::new("a@b.com").is_some());
        assert!(Email::new("john.doe+tag@mail.example.org").is_some());

        assert!(Email::new("").is_none());
        assert!(Email::new("a@b").is_none());
        assert!(Email::new("a b@c.com").is_none());
        assert!(Email::new("@b.com").is_none());
        assert!(Email::new("a@@b.com").is_none());
        assert!(Email::new("a@b..com").is_none());
    }

    #[test]
    fn lowercases_email_domain() {
        assert_eq!(
            Email::new("John@Example.COM").unwrap().as_ref(),
            "John@example.com",
        );
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("John").is_some());
        assert!(Name::new("Mary Ann").is_some());

        assert!(Name::new("").is_none());
        assert!(Name::new(" John").is_none());
        assert!(Name::new("x".repeat(257)).is_none());
    }

    #[test]
    fn validates_profile_image() {
        assert!(ProfileImage::new("https://cdn.example.com/a.png").is_some());
        assert!(ProfileImage::new("").is_none());
        assert!(ProfileImage::new("a b.png").is_none());
    }

    #[test]
    fn only_admins_are_admins() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::Superadmin.is_admin());
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::Superadmin);
    }

    #[test]
    fn status_has_lowercase_form() {
        assert_eq!(Status::Inactive.to_string(), "inactive");
        assert_eq!(Status::Active.as_str(), "active");
        assert_eq!("active".parse::<Status>().unwrap(), Status::Active);
        assert!("Active ".parse::<Status>().is_err());
    }
}
