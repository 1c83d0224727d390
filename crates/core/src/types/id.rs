//! Provider-issued user identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// The input string is empty or whitespace only.
    #[error("user id cannot be blank")]
    Blank,
}

/// A user identifier issued by the identity provider.
///
/// The identifier is the primary key of the local user store and never
/// changes once assigned. It is stored verbatim; the only validation is that
/// it contains at least one non-whitespace character.
///
/// ## Examples
///
/// ```
/// use identity_sync_core::UserId;
///
/// assert!(UserId::parse("user_2abc").is_ok());
///
/// assert!(UserId::parse("").is_err());
/// assert!(UserId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parse a `UserId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`UserIdError::Blank`] if the input has no non-whitespace characters.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        if s.trim().is_empty() {
            return Err(UserIdError::Blank);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(UserIdError::Blank);
        }
        Ok(Self(value))
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UserId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UserId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        assert!(UserId::parse("u1").is_ok());
        assert!(UserId::parse("user_2NNEqL2nrIRdJ194ndJqAHwEfxC").is_ok());
        assert!(UserId::parse("65f1c0ffee").is_ok());
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(UserId::parse(""), Err(UserIdError::Blank));
        assert_eq!(UserId::parse(" \t\n"), Err(UserIdError::Blank));
    }

    #[test]
    fn test_parse_keeps_value_verbatim() {
        let id = UserId::parse(" u1 ").unwrap();
        assert_eq!(id.as_str(), " u1 ");
    }

    #[test]
    fn test_serde_is_a_plain_string() {
        let id = UserId::parse("u1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u1\"");

        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<UserId>("\"  \"").is_err());
    }

    #[test]
    fn test_display() {
        let id: UserId = "u42".parse().unwrap();
        assert_eq!(format!("{id}"), "u42");
    }
}
