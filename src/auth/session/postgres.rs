//! `user_sessions` table, shared by every instance pointed at the same DSN.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use super::SessionStore;
use crate::auth::store::{db_span, unique_violation, StoreError};

/// Postgres intervals top out near 178 million years; stay far below that.
const MAX_TTL_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

fn interval_seconds(ttl: Duration) -> Result<i64, StoreError> {
    i64::try_from(ttl.as_secs())
        .ok()
        .filter(|seconds| *seconds <= MAX_TTL_SECONDS)
        .ok_or_else(|| StoreError::Unavailable(format!("session ttl {ttl:?} out of range")))
}

#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(
        &self,
        token_hash: &[u8],
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO user_sessions (session_hash, user_id, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let ttl_seconds = interval_seconds(ttl)?;
        let result = sqlx::query(query)
            .bind(token_hash)
            .bind(user_id)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match unique_violation(&err) {
                Some(key) => Err(StoreError::Duplicate(key)),
                None => Err(StoreError::Database(err)),
            },
        }
    }

    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<Uuid>, StoreError> {
        let query = r"
            SELECT user_id
            FROM user_sessions
            WHERE session_hash = $1
              AND expires_at > NOW()
            LIMIT 1
        ";
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(row.map(|row| row.get("user_id")))
    }

    async fn delete(&self, token_hash: &[u8]) -> Result<(), StoreError> {
        let query = "DELETE FROM user_sessions WHERE session_hash = $1";
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(())
    }
}
