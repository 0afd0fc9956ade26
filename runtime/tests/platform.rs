//! Integration tests for explicit platform configuration.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_identity_core::events::names;
use composable_identity_core::{AuthError, AuthenticationStatus, CoordinatorConfig, ProviderError};
use composable_identity_runtime::{SessionCoordinator, configure};
use composable_identity_testing::helpers::next_status;
use composable_identity_testing::mocks::{MockIdentityProvider, MockPlatformRuntime, MockStorageProvider};
use composable_identity_testing::test_platform_config;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_configure_registers_plugins_and_applies_config() {
    let runtime = MockPlatformRuntime::new();
    let config = test_platform_config();

    let handle = configure(&runtime, &config).await.unwrap();

    assert_eq!(runtime.plugin_registrations(), (1, 1));
    assert_eq!(runtime.configured_with(), Some(config));
    assert!(Arc::ptr_eq(&handle.identity(), &runtime_identity(&runtime)));
}

#[tokio::test]
async fn test_reconfigure_is_tolerated() {
    let runtime = MockPlatformRuntime::new();
    let config = test_platform_config();

    configure(&runtime, &config).await.unwrap();
    let second = configure(&runtime, &config).await;

    assert!(second.is_ok());
    assert_eq!(runtime.plugin_registrations(), (1, 1));
}

#[tokio::test]
async fn test_other_platform_failures_propagate() {
    let runtime = MockPlatformRuntime::new();
    runtime.fail_configure("Invalid user pool");

    let result = configure(&runtime, &test_platform_config()).await;

    assert_eq!(
        result.unwrap_err(),
        AuthError::Provider(ProviderError::service("Invalid user pool"))
    );
    assert_eq!(runtime.configured_with(), None);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_touching_runtime() {
    let runtime = MockPlatformRuntime::new();
    let mut config = test_platform_config();
    config.bucket = String::new();

    let result = configure(&runtime, &config).await;

    assert!(matches!(result, Err(AuthError::Configuration(_))));
    assert_eq!(runtime.plugin_registrations(), (0, 0));
}

#[tokio::test]
async fn test_coordinator_configure_attaches_to_runtime_providers() {
    let identity = MockIdentityProvider::new();
    let runtime = MockPlatformRuntime::with_providers(identity.clone(), MockStorageProvider::new());

    let coordinator = SessionCoordinator::configure(
        &runtime,
        &test_platform_config(),
        CoordinatorConfig::default(),
    )
    .await
    .unwrap();
    let mut statuses = coordinator.subscribe().unwrap();

    // Mock clones share state and hub
    assert_eq!(identity.hub().subscriber_count(), 1);
    identity.hub().publish(names::SESSION_EXPIRED);
    assert_eq!(
        next_status(&mut statuses, Duration::from_secs(1)).await,
        Some(AuthenticationStatus::Unauthenticated)
    );
}

fn runtime_identity(runtime: &MockPlatformRuntime) -> Arc<MockIdentityProvider> {
    use composable_identity_core::providers::PlatformRuntime;
    runtime.identity()
}
