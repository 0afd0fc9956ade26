//! User attributes as stored by the identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix the identity provider uses for application-defined attributes.
pub const CUSTOM_PREFIX: &str = "custom:";

/// Attribute key.
///
/// Well-known keys have their own variant; application-defined keys are
/// kept without their `custom:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeKey {
    /// Subject (stable user id).
    Sub,
    /// Phone number.
    PhoneNumber,
    /// Email address.
    Email,
    /// Profile picture URL.
    Picture,
    /// Display name.
    Name,
    /// Application-defined key (stored as `custom:<name>`).
    Custom(String),
}

impl AttributeKey {
    /// Custom key for the user's occupation.
    pub const OCCUPATION: &'static str = "occupation";
    /// Custom key for the user's company.
    pub const COMPANY: &'static str = "company";
    /// Custom key for the user's age.
    pub const AGE: &'static str = "age";
    /// Custom key for the user's gender code.
    pub const GENDER: &'static str = "gender";

    /// Build a custom key from its bare name.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Parse a key as the provider spells it.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "sub" => Self::Sub,
            "phone_number" => Self::PhoneNumber,
            "email" => Self::Email,
            "picture" => Self::Picture,
            "name" => Self::Name,
            other => Self::Custom(
                other
                    .strip_prefix(CUSTOM_PREFIX)
                    .unwrap_or(other)
                    .to_string(),
            ),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sub => write!(f, "sub"),
            Self::PhoneNumber => write!(f, "phone_number"),
            Self::Email => write!(f, "email"),
            Self::Picture => write!(f, "picture"),
            Self::Name => write!(f, "name"),
            Self::Custom(name) => write!(f, "{CUSTOM_PREFIX}{name}"),
        }
    }
}

impl From<String> for AttributeKey {
    fn from(key: String) -> Self {
        Self::parse(&key)
    }
}

impl From<AttributeKey> for String {
    fn from(key: AttributeKey) -> Self {
        key.to_string()
    }
}

/// One attribute key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    /// Attribute key
    pub key: AttributeKey,
    /// Attribute value (always a string on the wire)
    pub value: String,
}

impl UserAttribute {
    /// Create an attribute.
    #[must_use]
    pub fn new(key: AttributeKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Per-attribute outcome of a batch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAttributeResult {
    /// Whether the provider applied the update.
    pub is_updated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips_through_provider_spelling() {
        for key in [
            AttributeKey::Sub,
            AttributeKey::PhoneNumber,
            AttributeKey::Email,
            AttributeKey::Picture,
            AttributeKey::Name,
            AttributeKey::custom(AttributeKey::OCCUPATION),
        ] {
            assert_eq!(AttributeKey::parse(&key.to_string()), key);
        }
    }

    #[test]
    fn test_custom_key_display() {
        assert_eq!(
            AttributeKey::custom(AttributeKey::COMPANY).to_string(),
            "custom:company"
        );
        assert_eq!(
            AttributeKey::parse("custom:age"),
            AttributeKey::Custom("age".to_string())
        );
    }
}
