//! Postgres-backed Profile Store.
//!
//! Uses the `users` table, created on start-up if missing. Email uniqueness
//! is enforced by a unique index on `lower(email)`, so concurrent inserts for
//! the same address surface as [`DomainError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use idsync_auth::Role;
use idsync_core::{DomainError, DomainResult, ProfileId};

use super::{NewProfile, ProfileRecord, ProfileRepository};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        email         VARCHAR(255) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        first_name    VARCHAR(100),
        last_name     VARCHAR(100),
        role          VARCHAR(32)  NOT NULL,
        phone         VARCHAR(32),
        avatar_url    VARCHAR(512),
        is_active     BOOLEAN      NOT NULL DEFAULT TRUE,
        created_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
        updated_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_key ON users (lower(email))",
];

const COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, phone, \
                       avatar_url, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then create the schema if it does not exist yet.
    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        tracing::debug!("profile schema ready");
        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::conflict("User already exists with this email")
        }
        _ => DomainError::storage(err.to_string()),
    }
}

fn record_from_row(row: &PgRow) -> DomainResult<ProfileRecord> {
    let role: String = row.try_get("role").map_err(map_sqlx_error)?;
    let role = Role::normalize_and_validate(&role)
        .map_err(|e| DomainError::storage(format!("corrupt role column: {e}")))?;

    Ok(ProfileRecord {
        id: ProfileId::new(row.try_get::<i64, _>("id").map_err(map_sqlx_error)?),
        email: row.try_get("email").map_err(map_sqlx_error)?,
        password_hash: row.try_get("password_hash").map_err(map_sqlx_error)?,
        first_name: row.try_get("first_name").map_err(map_sqlx_error)?,
        last_name: row.try_get("last_name").map_err(map_sqlx_error)?,
        role,
        phone: row.try_get("phone").map_err(map_sqlx_error)?,
        avatar_url: row.try_get("avatar_url").map_err(map_sqlx_error)?,
        is_active: row.try_get("is_active").map_err(map_sqlx_error)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl ProfileRepository for PostgresProfileStore {
    async fn find_all(&self) -> DomainResult<Vec<ProfileRecord>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(record_from_row).collect()
    }

    async fn find_by_id(&self, id: ProfileId) -> DomainResult<Option<ProfileRecord>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> DomainResult<Option<ProfileRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert(&self, profile: NewProfile) -> DomainResult<ProfileRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (
                email, password_hash, first_name, last_name, role, phone, avatar_url, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.role.as_str())
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        record_from_row(&row)
    }

    async fn save(&self, profile: &ProfileRecord) -> DomainResult<ProfileRecord> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                role = $6,
                phone = $7,
                avatar_url = $8,
                is_active = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(profile.id.value())
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.role.as_str())
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(DomainError::not_found(format!(
                "User not found with id: {}",
                profile.id
            ))),
        }
    }

    async fn delete(&self, id: ProfileId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
