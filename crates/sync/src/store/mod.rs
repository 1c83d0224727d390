//! Store adapters for the local user collection.
//!
//! The reconciliation engine only ever sees the [`UserStore`] trait. Two
//! adapters are provided:
//!
//! - [`PgUserStore`] - `PostgreSQL` via sqlx, the production store
//! - [`MemoryUserStore`] - in-process map for tests and local development
//!
//! Adapters receive an already-validated [`UserId`]; identifier repair or
//! coercion never happens at this layer.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use identity_sync_core::{IdentityPatch, UserId, UserRecord};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Errors a store adapter can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("user {0} already exists")]
    DuplicateId(UserId),

    /// Another uniqueness constraint rejected the write (e.g., email).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The store could not complete the operation; retrying later may succeed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write or returned data that cannot be read back.
    ///
    /// Redelivering the same event hits the same failure, so this is terminal.
    #[error("store rejected operation: {0}")]
    Invalid(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::UniqueViolation(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_owned(),
            ),
            sqlx::Error::Database(db_err) if is_transient_sqlstate(db_err.code().as_deref()) => {
                Self::Unavailable(e.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(e.to_string()),
            _ => Self::Invalid(e.to_string()),
        }
    }
}

/// SQLSTATE classes that clear up on their own: connection exceptions (08),
/// serialization failures and deadlocks (40), insufficient resources (53) and
/// operator intervention such as an admin shutdown (57).
fn is_transient_sqlstate(code: Option<&str>) -> bool {
    code.is_some_and(|code| ["08", "40", "53", "57"].iter().any(|class| code.starts_with(class)))
}

/// A persistent collection of [`UserRecord`]s keyed by [`UserId`].
///
/// Implementations must make each method a single atomic step: `create` is a
/// conditional insert, `update` a find-and-modify, and `delete` reports
/// whether it removed anything. Handlers rely on this to stay idempotent
/// without holding locks of their own.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a record by id.
    async fn find(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record.
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is taken and
    /// [`StoreError::UniqueViolation`] if another unique field collides.
    async fn create(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Overwrite the identity fields of an existing record.
    ///
    /// Returns the updated record, or `None` if no record has this id.
    /// `cart_items` must be left untouched.
    async fn update(
        &self,
        id: &UserId,
        patch: &IdentityPatch,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Remove a record, returning `true` if one existed.
    async fn delete(&self, id: &UserId) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(matches!(StoreError::from(sqlx::Error::Io(io)), StoreError::Unavailable(_)));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::Protocol("unexpected message".to_string())),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_decode_errors_are_invalid() {
        let err = StoreError::from(sqlx::Error::Decode(
            "invalid type: floating point `1.5`, expected u32".into(),
        ));
        assert!(matches!(err, StoreError::Invalid(ref msg) if msg.contains("floating point")));

        let err = StoreError::from(sqlx::Error::ColumnNotFound("cart_items".to_string()));
        assert!(matches!(err, StoreError::Invalid(ref msg) if msg.contains("cart_items")));

        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Invalid(_)
        ));
    }

    #[test]
    fn test_transient_sqlstate_classes() {
        // serialization_failure, deadlock_detected, too_many_connections, admin_shutdown
        for code in ["40001", "40P01", "53300", "57P01", "08006"] {
            assert!(is_transient_sqlstate(Some(code)), "{code} should be transient");
        }
        // not_null_violation, check_violation, foreign_key_violation, undefined_column
        for code in ["23502", "23514", "23503", "42703"] {
            assert!(!is_transient_sqlstate(Some(code)), "{code} should be terminal");
        }
        assert!(!is_transient_sqlstate(None));
    }
}
