//! Dispatcher entry points.
//!
//! The event transport calls one of these per inbound event. Each takes the
//! raw payload exactly as delivered and returns a [`SyncResult`]; none of them
//! can fail, so the transport decides on redelivery purely from
//! [`SyncResult::is_retryable`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::normalize::{RejectionReason, normalize};
use crate::outcome::SyncResult;
use crate::reconcile::Reconciler;
use crate::store::UserStore;

/// The user lifecycle events this crate handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// `user.created`: insert the user unless already present.
    Created,
    /// `user.updated`: rewrite identity fields of an existing user.
    Updated,
    /// `user.deleted`: remove the user if present.
    Deleted,
}

impl LifecycleKind {
    /// All kinds, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Created, Self::Updated, Self::Deleted];

    /// Canonical event name without a provider prefix.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Created => "user.created",
            Self::Updated => "user.updated",
            Self::Deleted => "user.deleted",
        }
    }

    /// Match an event name such as `user.created` or `clerk/user.created`.
    ///
    /// Anything before the last `/` is treated as a provider prefix and ignored.
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        let name = name.rsplit_once('/').map_or(name, |(_, event)| event);
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_name() == name)
    }
}

/// An event envelope as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event name, optionally provider-prefixed.
    pub name: String,
    /// Raw payload. Missing and `null` are both treated as absent.
    #[serde(default)]
    pub data: Option<Value>,
}

impl<S: UserStore> Reconciler<S> {
    /// Entry point for `user.created` events.
    pub async fn handle_created(&self, payload: Option<&Value>) -> SyncResult {
        match normalize(payload) {
            Ok(record) => self.create(record).await,
            Err(reason) => rejected(LifecycleKind::Created, reason),
        }
    }

    /// Entry point for `user.updated` events.
    pub async fn handle_updated(&self, payload: Option<&Value>) -> SyncResult {
        match normalize(payload) {
            Ok(record) => self.update(record).await,
            Err(reason) => rejected(LifecycleKind::Updated, reason),
        }
    }

    /// Entry point for `user.deleted` events.
    pub async fn handle_deleted(&self, payload: Option<&Value>) -> SyncResult {
        self.delete(payload).await
    }

    /// Route a payload to the handler for `kind`.
    pub async fn dispatch(&self, kind: LifecycleKind, payload: Option<&Value>) -> SyncResult {
        match kind {
            LifecycleKind::Created => self.handle_created(payload).await,
            LifecycleKind::Updated => self.handle_updated(payload).await,
            LifecycleKind::Deleted => self.handle_deleted(payload).await,
        }
    }

    /// Route an envelope by its event name.
    ///
    /// Unknown names are rejected without touching the store.
    #[instrument(skip(self, event), fields(event = %event.name))]
    pub async fn dispatch_event(&self, event: &LifecycleEvent) -> SyncResult {
        let Some(kind) = LifecycleKind::from_event_name(&event.name) else {
            warn!("ignoring unsupported event");
            return SyncResult::with_detail(
                RejectionReason::UnsupportedEvent.into(),
                format!("unsupported event `{}`", event.name),
            );
        };
        self.dispatch(kind, event.data.as_ref()).await
    }
}

fn rejected(kind: LifecycleKind, reason: RejectionReason) -> SyncResult {
    warn!(kind = kind.event_name(), reason = %reason, "rejecting malformed event");
    reason.into()
}
