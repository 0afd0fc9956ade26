//! Platform runtime trait.

use super::identity::IdentityProvider;
use super::storage::StorageProvider;
use super::ProviderResult;
use crate::config::PlatformConfig;
use std::future::Future;
use std::sync::Arc;

/// The process-wide platform runtime that hosts the identity and storage
/// capabilities.
///
/// Plugins are registered, then the runtime is configured once. A runtime
/// that has already been configured (for example after a host restart)
/// reports [`ProviderError::AlreadyConfigured`](crate::error::ProviderError::AlreadyConfigured)
/// from any of these calls.
pub trait PlatformRuntime: Send + Sync {
    /// Identity capability type.
    type Identity: IdentityProvider + 'static;
    /// Storage capability type.
    type Storage: StorageProvider + 'static;

    /// Register the identity capability.
    ///
    /// # Errors
    ///
    /// Returns error if registration is rejected.
    fn add_identity_plugin(&self) -> ProviderResult<()>;

    /// Register the storage capability.
    ///
    /// # Errors
    ///
    /// Returns error if registration is rejected.
    fn add_storage_plugin(&self) -> ProviderResult<()>;

    /// Apply configuration and bring the registered plugins online.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is rejected.
    fn configure(&self, config: &PlatformConfig)
    -> impl Future<Output = ProviderResult<()>> + Send;

    /// Identity capability.
    fn identity(&self) -> Arc<Self::Identity>;

    /// Storage capability.
    fn storage(&self) -> Arc<Self::Storage>;
}
