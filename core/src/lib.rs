//! # Composable Identity Core
//!
//! Core types and capability traits for the Composable Identity session
//! coordinator.
//!
//! The coordinator is a façade over a managed identity and object-storage
//! platform. This crate holds everything it shares with hosts and tests:
//!
//! - **User**: immutable user record with copy-with-overrides updates
//! - **AuthenticationStatus**: the small status enum fanned out to subscribers
//! - **Providers**: capability traits for the external platform
//! - **Events**: raw provider events
//! - **Errors**: the local error type and the provider failure type
//! - **Config**: platform and coordinator configuration
//!
//! ## Example
//!
//! ```
//! use composable_identity_core::{AuthenticationStatus, User, UserPatch};
//!
//! let user = User::empty().copy_with(UserPatch::new().id("u-1"));
//! assert!(!user.is_empty());
//! assert_eq!(AuthenticationStatus::default(), AuthenticationStatus::Unknown);
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod attributes;
pub mod config;
pub mod error;
pub mod events;
pub mod providers;
pub mod status;
pub mod user;

// Re-export main types for convenience
pub use attributes::{AttributeKey, UpdateAttributeResult, UserAttribute};
pub use config::{ConfigError, CoordinatorConfig, PlatformConfig};
pub use error::{AuthError, ProviderError, Result};
pub use events::{HubEvent, HubEventStream};
pub use status::AuthenticationStatus;
pub use user::{User, UserPatch};
