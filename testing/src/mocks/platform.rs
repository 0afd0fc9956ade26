//! In-memory platform runtime.

use super::identity::MockIdentityProvider;
use super::storage::MockStorageProvider;
use composable_identity_core::PlatformConfig;
use composable_identity_core::error::ProviderError;
use composable_identity_core::providers::{PlatformRuntime, ProviderResult};
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct State {
    configured: Option<PlatformConfig>,
    identity_plugins: usize,
    storage_plugins: usize,
    configure_failure: Option<ProviderError>,
}

/// Mock platform runtime.
///
/// Mirrors the managed runtime's process-wide behavior: once configured,
/// every further plugin registration or configure call reports
/// [`ProviderError::AlreadyConfigured`].
#[derive(Debug, Clone)]
pub struct MockPlatformRuntime {
    state: Arc<Mutex<State>>,
    identity: Arc<MockIdentityProvider>,
    storage: Arc<MockStorageProvider>,
}

#[allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
impl MockPlatformRuntime {
    /// Create an unconfigured runtime over fresh mocks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_providers(MockIdentityProvider::new(), MockStorageProvider::new())
    }

    /// Create an unconfigured runtime over the given mocks.
    #[must_use]
    pub fn with_providers(identity: MockIdentityProvider, storage: MockStorageProvider) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            identity: Arc::new(identity),
            storage: Arc::new(storage),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make `configure` fail with `message`.
    pub fn fail_configure(&self, message: &str) {
        self.state().configure_failure = Some(ProviderError::service(message));
    }

    /// The configuration applied, if any.
    #[must_use]
    pub fn configured_with(&self) -> Option<PlatformConfig> {
        self.state().configured.clone()
    }

    /// Number of accepted `(identity, storage)` plugin registrations.
    #[must_use]
    pub fn plugin_registrations(&self) -> (usize, usize) {
        let state = self.state();
        (state.identity_plugins, state.storage_plugins)
    }
}

impl Default for MockPlatformRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformRuntime for MockPlatformRuntime {
    type Identity = MockIdentityProvider;
    type Storage = MockStorageProvider;

    fn add_identity_plugin(&self) -> ProviderResult<()> {
        let mut state = self.state();
        if state.configured.is_some() {
            return Err(ProviderError::AlreadyConfigured);
        }
        state.identity_plugins += 1;
        Ok(())
    }

    fn add_storage_plugin(&self) -> ProviderResult<()> {
        let mut state = self.state();
        if state.configured.is_some() {
            return Err(ProviderError::AlreadyConfigured);
        }
        state.storage_plugins += 1;
        Ok(())
    }

    fn configure(
        &self,
        config: &PlatformConfig,
    ) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = {
            let mut state = self.state();
            if let Some(error) = state.configure_failure.clone() {
                Err(error)
            } else if state.configured.is_some() {
                Err(ProviderError::AlreadyConfigured)
            } else {
                state.configured = Some(config.clone());
                Ok(())
            }
        };
        async move { result }
    }

    fn identity(&self) -> Arc<Self::Identity> {
        Arc::clone(&self.identity)
    }

    fn storage(&self) -> Arc<Self::Storage> {
        Arc::clone(&self.storage)
    }
}
