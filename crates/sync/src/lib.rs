//! Identity Sync - reconciles a local user store with identity provider
//! lifecycle events.
//!
//! # Architecture
//!
//! ```text
//! inbound event -> normalize -> Reconciler -> UserStore -> SyncResult
//! ```
//!
//! - [`normalize`] - Untyped payload to canonical [`UserRecord`], no side effects
//! - [`reconcile`] - Idempotent create/update/delete handlers
//! - [`dispatch`] - Entry points the event transport calls, one per lifecycle kind
//! - [`store`] - Store adapter trait with `PostgreSQL` and in-memory implementations
//! - [`outcome`] - Structured results; handlers never return errors
//! - [`config`] / [`telemetry`] - Environment configuration and tracing/Sentry setup
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use identity_sync::{PgUserStore, Reconciler, SyncConfig, store::postgres};
//!
//! let config = SyncConfig::from_env()?;
//! let _sentry = identity_sync::telemetry::init(&config);
//!
//! let pool = postgres::create_pool(&config.database).await?;
//! postgres::run_migrations(&pool).await?;
//! let reconciler = Reconciler::with_policy(PgUserStore::new(pool.clone()), config.policy);
//!
//! let payload = serde_json::json!({ "id": "u1", "first_name": "Ada" });
//! let result = reconciler.handle_created(Some(&payload)).await;
//! if result.is_retryable() {
//!     // hand back to the transport for redelivery
//! }
//!
//! pool.close().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dispatch;
pub mod normalize;
pub mod outcome;
pub mod reconcile;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, DatabaseConfig, SyncConfig};
pub use dispatch::{LifecycleEvent, LifecycleKind};
pub use identity_sync_core::{CartItems, IdentityPatch, UserId, UserRecord};
pub use normalize::{RejectionReason, normalize, resolve_identifier};
pub use outcome::{Outcome, SyncResult};
pub use reconcile::{MissingEmailPolicy, Reconciler, SyncPolicy};
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};
