//! Payload normalization.
//!
//! Identity provider payloads are untyped JSON whose shape drifts between
//! event kinds and provider versions. This module turns them into a
//! [`UserRecord`] or a [`RejectionReason`] using an explicit, ordered list of
//! accepted field aliases. Nothing here touches the store.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use identity_sync_core::{PLACEHOLDER_NAME, UserId, UserRecord};

/// Field names checked, in order, for the provider-issued identifier.
pub const ID_ALIASES: &[&str] = &["id", "_id", "user_id"];

/// Why an event could not be turned into a store mutation.
///
/// Every reason is terminal: redelivering the same payload cannot fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// The event carried no payload at all.
    #[error("event payload is missing")]
    MissingPayload,
    /// No identifier alias held a non-blank string.
    #[error("event payload has no usable user id")]
    MissingId,
    /// The payload has no email and the sync policy requires one.
    #[error("event payload has no email address")]
    MissingEmail,
    /// The event name is not one of the handled lifecycle kinds.
    #[error("event is not a user lifecycle event")]
    UnsupportedEvent,
}

/// Normalize a create or update payload into a canonical user record.
///
/// The returned record always has an empty cart; cart state is owned by the
/// store and never derived from identity events.
///
/// # Errors
///
/// Returns [`RejectionReason::MissingPayload`] for an absent or `null` payload,
/// and [`RejectionReason::MissingId`] when the payload is not an object or none
/// of [`ID_ALIASES`] holds a non-blank string.
pub fn normalize(payload: Option<&Value>) -> Result<UserRecord, RejectionReason> {
    let Value::Object(fields) = present(payload)? else {
        return Err(RejectionReason::MissingId);
    };

    let id = identifier_from_fields(fields).ok_or(RejectionReason::MissingId)?;

    Ok(UserRecord::new(
        id,
        display_name(fields),
        primary_email(fields),
        image_url(fields),
    ))
}

/// Resolve the identifier of a delete payload.
///
/// Deletion events are the only ones allowed to carry a bare identifier
/// string instead of an object.
///
/// # Errors
///
/// Returns [`RejectionReason::MissingPayload`] for an absent or `null` payload,
/// and [`RejectionReason::MissingId`] when no non-blank identifier can be found.
pub fn resolve_identifier(payload: Option<&Value>) -> Result<UserId, RejectionReason> {
    match present(payload)? {
        Value::String(raw) => UserId::parse(raw).map_err(|_| RejectionReason::MissingId),
        Value::Object(fields) => identifier_from_fields(fields).ok_or(RejectionReason::MissingId),
        _ => Err(RejectionReason::MissingId),
    }
}

fn present(payload: Option<&Value>) -> Result<&Value, RejectionReason> {
    match payload {
        None | Some(Value::Null) => Err(RejectionReason::MissingPayload),
        Some(value) => Ok(value),
    }
}

fn identifier_from_fields(fields: &Map<String, Value>) -> Option<UserId> {
    ID_ALIASES.iter().find_map(|alias| {
        fields
            .get(*alias)
            .and_then(Value::as_str)
            .and_then(|raw| UserId::parse(raw).ok())
    })
}

/// A string field with surrounding whitespace removed, if it has any content.
fn trimmed<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn display_name(fields: &Map<String, Value>) -> String {
    let parts: Vec<&str> = ["first_name", "last_name"]
        .iter()
        .filter_map(|key| trimmed(fields.get(*key)))
        .collect();

    if parts.is_empty() {
        PLACEHOLDER_NAME.to_owned()
    } else {
        parts.join(" ")
    }
}

fn primary_email(fields: &Map<String, Value>) -> String {
    fields
        .get("email_addresses")
        .and_then(Value::as_array)
        .and_then(|entries| {
            entries
                .iter()
                .find_map(|entry| trimmed(entry.get("email_address")))
        })
        .or_else(|| trimmed(fields.get("email_address")))
        .or_else(|| trimmed(fields.get("email")))
        .unwrap_or_default()
        .to_owned()
}

fn image_url(fields: &Map<String, Value>) -> String {
    fields
        .get("image_url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
