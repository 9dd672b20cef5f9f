//! [`Database`]-related implementations.

#[cfg(test)]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(test)]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint on emails of [`User`]s.
///
/// [`User`]: crate::domain::User
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    #[cfg(test)]
    /// [`Memory`] error.
    Memory(memory::Error),
}

impl Error {
    /// Checks if this [`Error`] is a unique violation of the specified
    /// constraint (or of any one, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(constraint),
            #[cfg(test)]
            Self::Memory(ref e) => e.is_unique_violation(constraint),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{memory, Error, USER_EMAIL_CONSTRAINT};

    #[test]
    fn wraps_memory_unique_violation() {
        let err = Error::from(memory::Error::UniqueViolation(
            USER_EMAIL_CONSTRAINT,
        ));

        assert!(err.is_unique_violation(None));
        assert!(err.is_unique_violation(Some(USER_EMAIL_CONSTRAINT)));
        assert!(!err.is_unique_violation(Some("users_pkey")));
        assert_eq!(
            err.to_string(),
            "Unique constraint `users_email_key` is violated",
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
