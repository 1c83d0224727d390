//! Core types for Identity Sync.
//!
//! This module provides type-safe wrappers for the synced user domain.

pub mod id;
pub mod user;

pub use id::{UserId, UserIdError};
pub use user::{CartItems, IdentityPatch, PLACEHOLDER_NAME, UserRecord};
