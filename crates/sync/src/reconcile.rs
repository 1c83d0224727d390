//! Idempotent lifecycle reconciliation.
//!
//! Each handler is a short, bounded sequence of store calls that is safe to
//! repeat under at-least-once delivery and safe to run concurrently with
//! handlers for the same id:
//!
//! | state        | create          | update            | delete     |
//! |--------------|-----------------|-------------------|------------|
//! | non-existent | `Created`       | `NotFound`        | `NotFound` |
//! | active       | `AlreadyExists` | `Updated`         | `Deleted`  |
//!
//! Updates never upsert: an update for a record whose create was lost or is
//! still in flight is reported as `NotFound` rather than fabricating a record.

use core::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use identity_sync_core::{CartItems, UserId, UserRecord};

use crate::normalize::{RejectionReason, resolve_identifier};
use crate::outcome::{Outcome, SyncResult};
use crate::store::{StoreError, UserStore};

/// What to do with create and update events that carry no email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MissingEmailPolicy {
    /// Persist the record with an empty email.
    #[default]
    Allow,
    /// Reject the event with [`RejectionReason::MissingEmail`].
    Reject,
}

/// Error parsing a [`MissingEmailPolicy`].
#[derive(Debug, Clone, Error)]
#[error("expected `allow` or `reject`, got `{0}`")]
pub struct ParsePolicyError(String);

impl FromStr for MissingEmailPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

impl fmt::Display for MissingEmailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Tunable reconciliation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncPolicy {
    /// Handling of records without an email address.
    pub missing_email: MissingEmailPolicy,
}

/// Applies lifecycle events to a [`UserStore`].
///
/// The store handle is passed in by the host process, which owns its
/// lifecycle; the reconciler itself holds no other state and can be shared
/// across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
    policy: SyncPolicy,
}

impl<S: UserStore> Reconciler<S> {
    /// Create a reconciler with the default policy.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_policy(store, SyncPolicy::default())
    }

    /// Create a reconciler with an explicit policy.
    #[must_use]
    pub const fn with_policy(store: S, policy: SyncPolicy) -> Self {
        Self { store, policy }
    }

    /// The store this reconciler writes to.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Insert `record` unless a record with its id already exists.
    ///
    /// The record is always stored with an empty cart.
    #[instrument(skip(self, record), fields(user_id = %record.id))]
    pub async fn create(&self, record: UserRecord) -> SyncResult {
        if let Some(rejected) = self.check_email(&record) {
            return rejected;
        }

        match self.store.find(&record.id).await {
            Ok(Some(_)) => {
                info!(outcome = %Outcome::AlreadyExists, "duplicate create delivery");
                return Outcome::AlreadyExists.into();
            }
            Ok(None) => {}
            Err(e) => return store_failure(&record.id, e),
        }

        let record = UserRecord {
            cart_items: CartItems::new(),
            ..record
        };

        match self.store.create(&record).await {
            Ok(()) => {
                info!(outcome = %Outcome::Created, "user created");
                Outcome::Created.into()
            }
            Err(StoreError::DuplicateId(_)) => {
                // Lost the race against a concurrent delivery of the same create.
                info!(outcome = %Outcome::AlreadyExists, "user created concurrently");
                Outcome::AlreadyExists.into()
            }
            Err(e) => store_failure(&record.id, e),
        }
    }

    /// Rewrite the identity fields of an existing record.
    ///
    /// `cart_items` is never touched, and a missing record is never created.
    #[instrument(skip(self, record), fields(user_id = %record.id))]
    pub async fn update(&self, record: UserRecord) -> SyncResult {
        if let Some(rejected) = self.check_email(&record) {
            return rejected;
        }

        match self.store.find(&record.id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                info!(outcome = %Outcome::NotFound, "update for unknown user");
                return Outcome::NotFound.into();
            }
            Err(e) => return store_failure(&record.id, e),
        }

        match self.store.update(&record.id, &record.identity_patch()).await {
            Ok(Some(_)) => {
                info!(outcome = %Outcome::Updated, "user updated");
                Outcome::Updated.into()
            }
            Ok(None) => {
                // Deleted between the lookup and the write.
                info!(outcome = %Outcome::NotFound, "user disappeared during update");
                Outcome::NotFound.into()
            }
            Err(e) => store_failure(&record.id, e),
        }
    }

    /// Remove the record identified by a delete payload.
    ///
    /// Accepts either a bare identifier string or an object carrying one of
    /// the identifier aliases.
    pub async fn delete(&self, payload: Option<&Value>) -> SyncResult {
        match resolve_identifier(payload) {
            Ok(id) => self.delete_id(&id).await,
            Err(reason) => {
                warn!(
                    outcome = %Outcome::InvalidIdentifier,
                    reason = %reason,
                    "delete event without a usable id"
                );
                SyncResult::with_detail(Outcome::InvalidIdentifier, reason.to_string())
            }
        }
    }

    /// Remove the record with `id`; a missing record is a no-op.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_id(&self, id: &UserId) -> SyncResult {
        match self.store.delete(id).await {
            Ok(true) => {
                info!(outcome = %Outcome::Deleted, "user deleted");
                Outcome::Deleted.into()
            }
            Ok(false) => {
                info!(outcome = %Outcome::NotFound, "delete for unknown user");
                Outcome::NotFound.into()
            }
            Err(e) => store_failure(id, e),
        }
    }

    fn check_email(&self, record: &UserRecord) -> Option<SyncResult> {
        if self.policy.missing_email == MissingEmailPolicy::Reject && !record.has_email() {
            warn!(
                outcome = %Outcome::Rejected(RejectionReason::MissingEmail),
                "rejecting user without email"
            );
            return Some(RejectionReason::MissingEmail.into());
        }
        None
    }
}

/// Classify a store error into a conflict, a terminal store rejection, or a
/// retryable outage.
///
/// Error-level events become Sentry issues through the tracing layer, which is
/// how conflicts reach a human for manual reconciliation.
fn store_failure(id: &UserId, err: StoreError) -> SyncResult {
    match &err {
        StoreError::UniqueViolation(constraint) => {
            error!(
                outcome = %Outcome::Conflict,
                user_id = %id,
                constraint = %constraint,
                "identity event conflicts with an existing user"
            );
            SyncResult::with_detail(Outcome::Conflict, constraint.clone())
        }
        StoreError::DuplicateId(_) => {
            error!(
                outcome = %Outcome::Conflict,
                user_id = %id,
                constraint = "users_pkey",
                "unexpected duplicate id"
            );
            SyncResult::with_detail(Outcome::Conflict, err.to_string())
        }
        StoreError::Invalid(message) => {
            error!(outcome = %Outcome::StoreRejected, error = %message, "store rejected operation");
            SyncResult::with_detail(Outcome::StoreRejected, message.clone())
        }
        StoreError::Unavailable(message) => {
            error!(outcome = %Outcome::StoreUnavailable, error = %message, "store unavailable");
            SyncResult::with_detail(Outcome::StoreUnavailable, message.clone())
        }
    }
}
