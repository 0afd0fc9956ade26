//! Explicit platform initialization.
//!
//! The managed platform keeps process-wide configuration. Instead of
//! touching that state implicitly, hosts call [`configure`] once and pass
//! the returned [`PlatformHandle`] into the session coordinator.

use composable_identity_core::error::ProviderError;
use composable_identity_core::providers::{IdentityProvider, PlatformRuntime, StorageProvider};
use composable_identity_core::{AuthError, PlatformConfig, Result};
use std::sync::Arc;

/// Configured identity and storage capabilities.
pub struct PlatformHandle<I, S> {
    identity: Arc<I>,
    storage: Arc<S>,
}

impl<I, S> PlatformHandle<I, S>
where
    I: IdentityProvider,
    S: StorageProvider,
{
    /// Build a handle from capabilities that are already configured.
    #[must_use]
    pub const fn from_parts(identity: Arc<I>, storage: Arc<S>) -> Self {
        Self { identity, storage }
    }

    /// Identity capability.
    #[must_use]
    pub fn identity(&self) -> Arc<I> {
        Arc::clone(&self.identity)
    }

    /// Storage capability.
    #[must_use]
    pub fn storage(&self) -> Arc<S> {
        Arc::clone(&self.storage)
    }
}

impl<I, S> Clone for PlatformHandle<I, S> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<I, S> std::fmt::Debug for PlatformHandle<I, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformHandle").finish_non_exhaustive()
    }
}

/// Register the identity and storage plugins and configure the runtime.
///
/// A runtime that reports [`ProviderError::AlreadyConfigured`] at any step is
/// treated as configured; hosts may re-run initialization after a restart.
///
/// # Errors
///
/// - [`AuthError::Configuration`] if `config` is invalid
/// - [`AuthError::Provider`] for any other platform failure
pub async fn configure<P>(
    runtime: &P,
    config: &PlatformConfig,
) -> Result<PlatformHandle<P::Identity, P::Storage>>
where
    P: PlatformRuntime,
{
    config
        .validate()
        .map_err(|e| AuthError::Configuration(e.to_string()))?;

    tolerate_already_configured("add_identity_plugin", runtime.add_identity_plugin())?;
    tolerate_already_configured("add_storage_plugin", runtime.add_storage_plugin())?;
    tolerate_already_configured("configure", runtime.configure(config).await)?;

    tracing::info!(
        region = %config.region,
        bucket = %config.bucket,
        "Identity platform configured"
    );

    Ok(PlatformHandle::from_parts(runtime.identity(), runtime.storage()))
}

fn tolerate_already_configured(
    step: &'static str,
    result: std::result::Result<(), ProviderError>,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(ProviderError::AlreadyConfigured) => {
            tracing::warn!(step, "Platform already configured, continuing");
            Ok(())
        }
        Err(e) => {
            tracing::error!(step, error = %e, "Platform configuration failed");
            Err(AuthError::Provider(e))
        }
    }
}
