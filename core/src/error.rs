//! Error types for identity and storage operations.
//!
//! Two layers exist:
//!
//! - [`ProviderError`] is what the external identity/storage platform reports.
//!   The platform does not distinguish network, validation or credential
//!   failures beyond a human-readable message.
//! - [`AuthError`] is what the session coordinator hands back to callers.
//!   Nearly every provider failure is wrapped into
//!   [`AuthError::Authentication`]; see the coordinator docs for the
//!   per-operation exceptions.

use thiserror::Error;

/// Result type alias for session coordinator operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure reported by the external identity or storage platform.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The platform runtime was already configured.
    ///
    /// Hosts may reconfigure on restart, so `configure` tolerates this.
    #[error("Platform is already configured")]
    AlreadyConfigured,

    /// Any other platform failure.
    #[error("{message}")]
    Service {
        /// Human-readable message from the platform
        message: String,
    },
}

impl ProviderError {
    /// Build a [`ProviderError::Service`] from any message.
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// The human-readable message carried by this error.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Errors returned by the session coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Delegated Call Failures
    // ═══════════════════════════════════════════════════════════

    /// An identity or storage call failed.
    ///
    /// This is the uniform wrapper for provider failures.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Message reported by the provider
        message: String,
    },

    /// A provider failure passed through without wrapping.
    ///
    /// Only `delete_user` and `configure` surface this variant.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Invalid configuration supplied to the coordinator or platform.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The coordinator (or its notifier) has been closed.
    #[error("Session coordinator has been disposed")]
    Disposed,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Internal invariant violation (poisoned lock, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Wrap a provider failure as [`AuthError::Authentication`].
    #[must_use]
    pub fn authentication(error: &ProviderError) -> Self {
        Self::Authentication {
            message: error.message(),
        }
    }

    /// Whether this error came from a delegated call (wrapped or not).
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Provider(_))
    }
}
