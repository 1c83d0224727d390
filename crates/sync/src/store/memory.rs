//! In-memory user store.
//!
//! Used by tests and local development where no database is available. All
//! mutations take a single write guard, so each call is atomic with respect
//! to every other call on the same store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use identity_sync_core::{IdentityPatch, UserId, UserRecord};

use super::{StoreError, UserStore};

/// Name reported for email collisions, matching the `PostgreSQL` index.
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// A [`UserStore`] backed by a shared `HashMap`.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record directly, bypassing reconciliation.
    ///
    /// Intended for seeding fixtures such as a populated cart.
    pub async fn seed(&self, record: UserRecord) {
        self.users.write().await.insert(record.id.clone(), record);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Snapshot of every stored record, ordered by id.
    pub async fn snapshot(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }
}

/// Whether `email` is already used by a record other than `owner`.
fn email_taken(users: &HashMap<UserId, UserRecord>, email: &str, owner: &UserId) -> bool {
    !email.is_empty()
        && users
            .values()
            .any(|user| user.id != *owner && user.email == email)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;

        if users.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        if email_taken(&users, &record.email, &record.id) {
            return Err(StoreError::UniqueViolation(EMAIL_CONSTRAINT.to_owned()));
        }

        users.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &UserId,
        patch: &IdentityPatch,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.users.write().await;

        if !users.contains_key(id) {
            return Ok(None);
        }
        if email_taken(&users, &patch.email, id) {
            return Err(StoreError::UniqueViolation(EMAIL_CONSTRAINT.to_owned()));
        }

        Ok(users.get_mut(id).map(|user| {
            user.apply(patch);
            user.clone()
        }))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}
