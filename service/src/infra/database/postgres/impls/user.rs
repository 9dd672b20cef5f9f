//! [`User`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `users` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, email, password_hash, \
    first_name, last_name, \
    role, status, profile_image, \
    created_at, updated_at, password_changed_at";

/// Builds a [`User`] out of the provided [`Row`] containing [`COLUMNS`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role: row.get("role"),
        status: row.get("status"),
        profile_image: row.get("profile_image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        password_changed_at: row.get("password_changed_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[user::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let user = from_row(row);
                (user.id, user)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<user::Id, User>, [user::Id; 1]>>,
        Ok = HashMap<user::Id, User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<User>, user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE email = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<User>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<User>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             ORDER BY created_at ASC, id ASC",
        );
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            email,
            password_hash,
            first_name,
            last_name,
            role,
            status,
            profile_image,
            created_at,
            updated_at,
            password_changed_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, email, password_hash, \
                first_name, last_name, \
                role, status, profile_image, \
                created_at, updated_at, password_changed_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, \
                $6::INT2, $7::INT2, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ, $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET email = EXCLUDED.email, \
                password_hash = EXCLUDED.password_hash, \
                first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name, \
                role = EXCLUDED.role, \
                status = EXCLUDED.status, \
                profile_image = EXCLUDED.profile_image, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at, \
                password_changed_at = EXCLUDED.password_changed_at";
        self.exec(
            SQL,
            &[
                &id,
                &email,
                &password_hash,
                &first_name,
                &last_name,
                &role,
                &status,
                &profile_image,
                &created_at,
                &updated_at,
                &password_changed_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM users \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|deleted| deleted > 0)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        // Updating the row on conflict holds its lock until the transaction
        // ends.
        const SQL: &str = "\
            INSERT INTO users_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
