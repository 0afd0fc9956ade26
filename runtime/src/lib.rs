//! # Composable Identity Runtime
//!
//! Runtime pieces of the Composable Identity architecture.
//!
//! ## Core Components
//!
//! - **Platform**: explicit configure step producing a [`PlatformHandle`]
//! - **Status notifier**: non-replaying multi-subscriber broadcast of
//!   [`AuthenticationStatus`](composable_identity_core::AuthenticationStatus)
//! - **Session coordinator**: wraps identity/storage calls, keeps the user
//!   record, and translates raw provider events into statuses
//!
//! ## Example
//!
//! ```ignore
//! use composable_identity_runtime::{platform, SessionCoordinator};
//!
//! let handle = platform::configure(&runtime, &PlatformConfig::from_env()?).await?;
//! let coordinator = SessionCoordinator::new(handle, CoordinatorConfig::default())?;
//!
//! let _listener = coordinator.listen(|status| tracing::info!(%status, "status changed"))?;
//! coordinator.is_signed_in().await;
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

/// Session coordinator over the identity and storage capabilities
pub mod coordinator;

/// Prometheus metrics for observability
pub mod metrics;

/// Broadcast of authentication statuses
pub mod notifier;

/// Explicit platform configuration
pub mod platform;

pub use coordinator::{SessionCoordinator, translate_event};
pub use notifier::{ListenerHandle, StatusNotifier, StatusSubscription};
pub use platform::{PlatformHandle, configure};
