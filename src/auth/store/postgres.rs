//! Postgres-backed credential store.
//!
//! Uniqueness is enforced by the `users_email_key` and
//! `users_google_subject_key` indexes (see `sql/schema.sql`); a violation is
//! reported as [`StoreError::Duplicate`] naming the index that fired.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{Instrument, Span};
use uuid::Uuid;

use super::{CredentialStore, StoreError, UniqueKey};
use crate::auth::user::{NewUser, User};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const USER_COLUMNS: &str = "id, email, username, password_hash, google_subject";

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, bind: QueryKey<'_>) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let query_ref = query.as_str();
        let built = sqlx::query(query_ref);
        let built = match bind {
            QueryKey::Id(id) => built.bind(id),
            QueryKey::Text(value) => built.bind(value),
        };
        let row = built
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query_ref))
            .await?;
        Ok(row.map(|row| user_from_row(&row)))
    }
}

enum QueryKey<'a> {
    Id(Uuid),
    Text(&'a str),
}

/// Apply `sql/schema.sql`, one statement at a time.
///
/// # Errors
/// Returns the first failing statement's error.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    let mut conn = pool.acquire().await?;
    for statement in split_sql_statements(SCHEMA_SQL) {
        sqlx::query(&statement)
            .execute(&mut *conn)
            .instrument(db_span("DDL", &statement))
            .await?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');
        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }
    statements
}

pub(crate) fn db_span(operation: &str, statement: &str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Map a Postgres unique violation (SQLSTATE 23505) to the index that fired.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<UniqueKey> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.code().is_some_and(|code| code.as_ref() == "23505") {
        return None;
    }
    let constraint = db_err.constraint().unwrap_or_default();
    if constraint.contains("google_subject") {
        Some(UniqueKey::GoogleSubject)
    } else if constraint.contains("session") {
        Some(UniqueKey::SessionHash)
    } else {
        Some(UniqueKey::Email)
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        google_subject: row.get("google_subject"),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.find_one("id", QueryKey::Id(id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", QueryKey::Text(email)).await
    }

    async fn find_by_google_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        self.find_one("google_subject", QueryKey::Text(subject))
            .await
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // Single statement: the row either commits with a fresh id or the
        // unique index rejects it. Nothing to roll back on client disconnect.
        let query = r"
            INSERT INTO users (id, email, username, password_hash, google_subject)
            VALUES ($1, $2, $3, $4, $5)
        ";
        let id = Uuid::new_v4();
        let result = sqlx::query(query)
            .bind(id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.google_subject)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(user.into_user(id)),
            Err(err) => match unique_violation(&err) {
                Some(key) => Err(StoreError::Duplicate(key)),
                None => Err(StoreError::Database(err)),
            },
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(tracing::info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await?;
        conn.ping()
            .instrument(tracing::info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgresql"
    }
}
