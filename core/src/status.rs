//! Authentication status values published by the session coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse authentication status.
///
/// Any status may follow any other; there is no transition validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationStatus {
    /// Nothing is known yet. Initial value.
    #[default]
    Unknown,
    /// A user is signed in.
    Authenticated,
    /// A user signed in as the last step of sign-up.
    AuthenticatedOnSignUp,
    /// No user is signed in.
    Unauthenticated,
}

impl AuthenticationStatus {
    /// Stable lowercase name, used for log fields and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authenticated => "authenticated",
            Self::AuthenticatedOnSignUp => "authenticated_on_sign_up",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Whether a user is signed in under this status.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::AuthenticatedOnSignUp)
    }
}

impl fmt::Display for AuthenticationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(AuthenticationStatus::default(), AuthenticationStatus::Unknown);
    }

    #[test]
    fn test_is_authenticated() {
        assert!(AuthenticationStatus::Authenticated.is_authenticated());
        assert!(AuthenticationStatus::AuthenticatedOnSignUp.is_authenticated());
        assert!(!AuthenticationStatus::Unauthenticated.is_authenticated());
        assert!(!AuthenticationStatus::Unknown.is_authenticated());
    }
}
