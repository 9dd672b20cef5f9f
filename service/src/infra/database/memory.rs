//! In-memory [`Database`] implementation for tests.
//!
//! Transactions are not isolated: [`Transact`] shares the same state and
//! [`Commit`] does nothing.

use std::{collections::HashMap, sync::Arc};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{session, user, Session, User},
    infra::{database, Database},
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<RwLock<State>>);

/// Stored data of a [`Memory`] client.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Session`]s.
    sessions: HashMap<session::Id, Session>,
}

impl State {
    /// Stores the provided [`User`], keeping emails unique.
    fn upsert_user(&mut self, user: User) -> Result<(), Error> {
        let occupied = self
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id);
        if occupied {
            return Err(Error::UniqueViolation(database::USER_EMAIL_CONSTRAINT));
        }
        drop(self.users.insert(user.id, user));
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if this [`Error`] is a unique violation of the specified
    /// constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |e| e == *c),
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.read().await.users.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<User>, user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .0
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

impl Database<Select<By<Vec<User>, ()>>> for Memory {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<User>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users =
            self.0.read().await.users.values().cloned().collect::<Vec<_>>();
        users.sort_by_key(|u| (u.created_at, u.id.to_string()));
        Ok(users)
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write()
            .await
            .upsert_user(user)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write()
            .await
            .upsert_user(user)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Delete<By<User, user::Id>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.write().await.users.remove(&by.into_inner()).is_some())
    }
}

impl Database<Insert<Session>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.0.write().await.sessions.insert(session.id, session));
        Ok(())
    }
}

impl Database<Select<By<Option<Session>, session::Id>>> for Memory {
    type Ok = Option<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Session>, session::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.read().await.sessions.get(&by.into_inner()).cloned())
    }
}

impl Memory {
    /// Returns all the stored [`Session`]s.
    pub async fn sessions(&self) -> Vec<Session> {
        self.0.read().await.sessions.values().cloned().collect()
    }
}
