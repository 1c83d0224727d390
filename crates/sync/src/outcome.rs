//! Structured results reported back to the event dispatcher.
//!
//! Handlers never return `Err`: every path ends in an [`Outcome`], and the
//! dispatcher decides whether to redeliver purely from
//! [`Outcome::is_retryable`].

use core::fmt;

use serde::{Serialize, Serializer};

use crate::normalize::RejectionReason;

/// What a lifecycle handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A new record was inserted.
    Created,
    /// The record already existed; a duplicate create delivery.
    AlreadyExists,
    /// The identity fields of an existing record were rewritten.
    Updated,
    /// The record was removed.
    Deleted,
    /// No record with that id exists; update and delete are no-ops.
    NotFound,
    /// The store refused the write on a uniqueness constraint.
    Conflict,
    /// A delete event whose identifier could not be resolved.
    InvalidIdentifier,
    /// The payload was rejected before reaching the store.
    Rejected(RejectionReason),
    /// The store could not be reached or failed transiently.
    StoreUnavailable,
    /// The store refused the operation in a way a redelivery cannot fix.
    StoreRejected,
}

impl Outcome {
    /// Stable wire name of the outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::Rejected(RejectionReason::MissingPayload) => "MISSING_PAYLOAD",
            Self::Rejected(RejectionReason::MissingId) => "MISSING_ID",
            Self::Rejected(RejectionReason::MissingEmail) => "MISSING_EMAIL",
            Self::Rejected(RejectionReason::UnsupportedEvent) => "UNSUPPORTED_EVENT",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::StoreRejected => "STORE_REJECTED",
        }
    }

    /// Whether redelivering the same event may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }

    /// Whether the event failed, as opposed to being applied or being an idempotent no-op.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Conflict
                | Self::InvalidIdentifier
                | Self::Rejected(_)
                | Self::StoreUnavailable
                | Self::StoreRejected
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<RejectionReason> for Outcome {
    fn from(reason: RejectionReason) -> Self {
        Self::Rejected(reason)
    }
}

/// The `{ outcome, detail? }` value returned by every dispatcher entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// What happened.
    pub outcome: Outcome,
    /// Human-readable context, such as the violated constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncResult {
    /// A result without detail.
    #[must_use]
    pub const fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            detail: None,
        }
    }

    /// A result carrying a detail message.
    #[must_use]
    pub fn with_detail(outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: Some(detail.into()),
        }
    }

    /// Shorthand for `self.outcome.is_retryable()`.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.outcome.is_retryable()
    }
}

impl From<Outcome> for SyncResult {
    fn from(outcome: Outcome) -> Self {
        Self::new(outcome)
    }
}

impl From<RejectionReason> for SyncResult {
    fn from(reason: RejectionReason) -> Self {
        Self::with_detail(Outcome::Rejected(reason), reason.to_string())
    }
}
