//! [`Session`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{session, Session},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Session>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        let Session {
            id,
            email,
            refresh_token,
            user_agent,
            client_ip,
            is_blocked,
            created_at,
            expires_at,
        } = session;

        const SQL: &str = "\
            INSERT INTO sessions (\
                id, email, refresh_token, \
                user_agent, client_ip, is_blocked, \
                created_at, expires_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::INET, $6::BOOL, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &email,
                &refresh_token,
                &user_agent,
                &client_ip,
                &is_blocked,
                &created_at,
                &expires_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Option<Session>, session::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Session>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Session>, session::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: session::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, email, refresh_token, \
                   user_agent, client_ip, is_blocked, \
                   created_at, expires_at \
            FROM sessions \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Session {
                id: row.get("id"),
                email: row.get("email"),
                refresh_token: row.get("refresh_token"),
                user_agent: row.get("user_agent"),
                client_ip: row.get("client_ip"),
                is_blocked: row.get("is_blocked"),
                created_at: row.get("created_at"),
                expires_at: row.get("expires_at"),
            }))
    }
}
