//! Integration tests for Identity Sync.
//!
//! # Running Tests
//!
//! ```bash
//! # Memory-store lifecycle suite (no external services)
//! cargo test -p identity-sync-integration-tests
//!
//! # PostgreSQL suite
//! SYNC_DATABASE_URL=postgres://localhost/identity_sync_test \
//!     cargo test -p identity-sync-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `lifecycle` - End-to-end event scenarios against the in-memory store
//! - `postgres_store` - The same guarantees against a real `users` table

use serde_json::{Value, json};

/// Creation payload in the shape the identity provider sends.
#[must_use]
pub fn created_payload(id: &str, first: &str, last: &str, email: &str) -> Value {
    json!({
        "id": id,
        "object": "user",
        "first_name": first,
        "last_name": last,
        "email_addresses": [{ "id": format!("idn_{id}"), "email_address": email }],
        "image_url": "",
    })
}

/// Deletion payload in the object form (`{ id, deleted }`).
#[must_use]
pub fn deleted_payload(id: &str) -> Value {
    json!({ "id": id, "object": "user", "deleted": true })
}
