//! `PostgreSQL` user store.
//!
//! # Table: `users`
//!
//! | column       | type          | notes                                  |
//! |--------------|---------------|----------------------------------------|
//! | `id`         | `TEXT`        | primary key, provider-issued           |
//! | `name`       | `TEXT`        |                                        |
//! | `email`      | `TEXT`        | unique when non-empty (`users_email_key`) |
//! | `image_url`  | `TEXT`        | defaults to `''`                       |
//! | `cart_items` | `JSONB`       | store-owned, defaults to `{}`          |
//!
//! # Migrations
//!
//! Migrations are stored in `crates/sync/migrations/` and applied with
//! [`run_migrations`].

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::{debug, instrument};

use identity_sync_core::{CartItems, IdentityPatch, UserId, UserRecord};

use super::{StoreError, UserStore};
use crate::config::DatabaseConfig;

/// Create a `PostgreSQL` connection pool from configuration.
///
/// The pool is acquired once by the host process and closed at shutdown
/// with [`PgPool::close`].
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.url.expose_secret())
        .await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the database is unreachable.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    image_url: String,
    cart_items: Json<CartItems>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            image_url: row.image_url,
            cart_items: row.cart_items.0,
        }
    }
}

/// A [`UserStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn find(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, image_url, cart_items
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    #[instrument(skip(self, record), fields(user_id = %record.id))]
    async fn create(&self, record: &UserRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, name, email, image_url, cart_items)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.image_url)
        .bind(Json(&record.cart_items))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!("insert skipped, id already present");
            return Err(StoreError::DuplicateId(record.id.clone()));
        }

        Ok(())
    }

    #[instrument(skip(self, patch), fields(user_id = %id))]
    async fn update(
        &self,
        id: &UserId,
        patch: &IdentityPatch,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = $2, email = $3, image_url = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, image_url, cart_items
            ",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: &UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
