//! # Composable Identity Testing
//!
//! Testing utilities for the Composable Identity session coordinator.
//!
//! This crate provides:
//! - In-memory fakes of the identity, storage and platform capabilities
//! - A raw event channel the fakes publish on
//! - Fixtures and helpers for collecting status emissions
//!
//! ## Example
//!
//! ```
//! use composable_identity_core::{AuthenticationStatus, CoordinatorConfig};
//! use composable_identity_core::events::names;
//! use composable_identity_runtime::SessionCoordinator;
//! use composable_identity_testing::{helpers, test_environment};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = test_environment();
//! let coordinator = SessionCoordinator::new(env.handle(), CoordinatorConfig::default())?;
//! let mut statuses = coordinator.subscribe()?;
//!
//! env.identity.hub().publish(names::SESSION_EXPIRED);
//!
//! let received = helpers::next_status(&mut statuses, Duration::from_secs(1)).await;
//! assert_eq!(received, Some(AuthenticationStatus::Unauthenticated));
//! # Ok(())
//! # }
//! ```

use composable_identity_core::PlatformConfig;
use composable_identity_runtime::PlatformHandle;
use std::sync::Arc;

/// In-memory fakes of the platform capabilities.
pub mod mocks {
    pub mod hub;
    pub mod identity;
    pub mod platform;
    pub mod storage;

    pub use hub::HubEventSource;
    pub use identity::{
        DEFAULT_CONFIRMATION_CODE, IdentityCall, IdentityOperation, MockIdentityProvider,
    };
    pub use platform::MockPlatformRuntime;
    pub use storage::{MOCK_STORAGE_BASE_URL, MockStorageProvider};
}

/// Helpers for observing status emissions.
pub mod helpers {
    use composable_identity_core::AuthenticationStatus;
    use composable_identity_runtime::StatusSubscription;
    use std::time::Duration;

    /// Wait up to `timeout` for the next status.
    pub async fn next_status(
        subscription: &mut StatusSubscription,
        timeout: Duration,
    ) -> Option<AuthenticationStatus> {
        tokio::time::timeout(timeout, subscription.recv())
            .await
            .ok()
            .flatten()
    }

    /// Collect up to `count` statuses, giving up after `timeout` overall.
    pub async fn collect_statuses(
        subscription: &mut StatusSubscription,
        count: usize,
        timeout: Duration,
    ) -> Vec<AuthenticationStatus> {
        let mut received = Vec::with_capacity(count);
        let _ = tokio::time::timeout(timeout, async {
            while received.len() < count {
                match subscription.recv().await {
                    Some(status) => received.push(status),
                    None => break,
                }
            }
        })
        .await;
        received
    }

    /// Whether no status arrives within `wait`.
    pub async fn stays_quiet(subscription: &mut StatusSubscription, wait: Duration) -> bool {
        next_status(subscription, wait).await.is_none()
    }

    /// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Mock identity and storage capabilities plus a handle over them.
#[derive(Debug, Clone)]
pub struct TestEnvironment {
    /// Identity fake
    pub identity: Arc<mocks::MockIdentityProvider>,
    /// Storage fake
    pub storage: Arc<mocks::MockStorageProvider>,
}

impl TestEnvironment {
    /// Handle to pass to `SessionCoordinator::new`.
    #[must_use]
    pub fn handle(&self) -> PlatformHandle<mocks::MockIdentityProvider, mocks::MockStorageProvider> {
        PlatformHandle::from_parts(Arc::clone(&self.identity), Arc::clone(&self.storage))
    }
}

/// Environment with no accounts and nobody signed in.
#[must_use]
pub fn test_environment() -> TestEnvironment {
    TestEnvironment {
        identity: Arc::new(mocks::MockIdentityProvider::new()),
        storage: Arc::new(mocks::MockStorageProvider::new()),
    }
}

/// Environment with `user-1` / `+15550100` already signed in.
#[must_use]
pub fn signed_in_environment() -> TestEnvironment {
    TestEnvironment {
        identity: Arc::new(mocks::MockIdentityProvider::with_signed_in_user(
            "user-1",
            "+15550100",
        )),
        storage: Arc::new(mocks::MockStorageProvider::new()),
    }
}

/// Platform configuration with valid placeholder values.
#[must_use]
pub fn test_platform_config() -> PlatformConfig {
    PlatformConfig::new(
        "test-region".to_string(),
        "test-region_pool".to_string(),
        "test-client".to_string(),
        "test-bucket".to_string(),
    )
    .with_identity_pool_id("test-region:identity-pool")
}
