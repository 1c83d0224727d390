//! Canonical user record types.
//!
//! A [`UserRecord`] splits into two groups of fields: identity fields that the
//! identity provider owns (`name`, `email`, `image_url`) and store-owned state
//! (`cart_items`). Lifecycle events may only ever write the identity group,
//! which is what [`IdentityPatch`] carries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Display name used when a provider payload has neither a first nor last name.
pub const PLACEHOLDER_NAME: &str = "Unknown";

/// Cart contents, keyed by item id with the quantity as value.
pub type CartItems = BTreeMap<String, u32>;

/// The canonical user record kept in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Provider-issued identifier, primary key of the store.
    pub id: UserId,
    /// Display name derived from the provider's first/last name fields.
    pub name: String,
    /// Primary email address. Empty when the provider supplied none.
    pub email: String,
    /// Avatar URL. Empty when the provider supplied none.
    #[serde(default)]
    pub image_url: String,
    /// Store-owned cart state. Never written by identity events.
    #[serde(default)]
    pub cart_items: CartItems,
}

impl UserRecord {
    /// Create a record with an empty cart.
    #[must_use]
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            image_url: image_url.into(),
            cart_items: CartItems::new(),
        }
    }

    /// Returns `true` if the record carries a non-blank email address.
    #[must_use]
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// Extract the identity fields of this record as a patch.
    #[must_use]
    pub fn identity_patch(&self) -> IdentityPatch {
        IdentityPatch {
            name: self.name.clone(),
            email: self.email.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// Overwrite the identity fields from `patch`, leaving `id` and `cart_items` as they are.
    pub fn apply(&mut self, patch: &IdentityPatch) {
        self.name.clone_from(&patch.name);
        self.email.clone_from(&patch.email);
        self.image_url.clone_from(&patch.image_url);
    }
}

/// The identity fields an update event is allowed to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    /// New display name.
    pub name: String,
    /// New email address.
    pub email: String,
    /// New avatar URL.
    pub image_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record() -> UserRecord {
        UserRecord::new(
            UserId::parse("u1").unwrap(),
            "Ada Lovelace",
            "a@x.com",
            "",
        )
    }

    #[test]
    fn test_new_starts_with_empty_cart() {
        assert!(record().cart_items.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "u1",
                "name": "Ada Lovelace",
                "email": "a@x.com",
                "imageUrl": "",
                "cartItems": {}
            })
        );
    }

    #[test]
    fn test_apply_keeps_cart_items() {
        let mut user = record();
        user.cart_items.insert("sku-1".to_string(), 3);

        user.apply(&IdentityPatch {
            name: "Augusta King".to_string(),
            email: "ada@example.com".to_string(),
            image_url: "https://img.example.com/ada.png".to_string(),
        });

        assert_eq!(user.name, "Augusta King");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.image_url, "https://img.example.com/ada.png");
        assert_eq!(user.cart_items.get("sku-1"), Some(&3));
        assert_eq!(user.id.as_str(), "u1");
    }

    #[test]
    fn test_has_email() {
        let mut user = record();
        assert!(user.has_email());
        user.email = "  ".to_string();
        assert!(!user.has_email());
    }

    #[test]
    fn test_deserialize_defaults_store_fields() {
        let user: UserRecord = serde_json::from_value(json!({
            "id": "u2",
            "name": "Unknown",
            "email": ""
        }))
        .unwrap();
        assert_eq!(user.image_url, "");
        assert!(user.cart_items.is_empty());
    }
}
