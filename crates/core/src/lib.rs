//! Identity Sync Core - Shared types library.
//!
//! This crate provides the domain types used across Identity Sync components:
//! - `sync` - Payload normalization and lifecycle reconciliation
//! - `integration-tests` - End-to-end lifecycle suites
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no event transport. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated user identifiers and the canonical user record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
