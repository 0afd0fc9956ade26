//! Capability interfaces for the external identity and storage platform.
//!
//! This module defines traits for every external dependency the session
//! coordinator uses. The coordinator depends only on these traits; the
//! host supplies concrete implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   configure()   ┌──────────────────────┐
//! │ PlatformRuntime  │────────────────▶│ PlatformHandle<I, S> │
//! │ (process-wide)   │                 └──────────┬───────────┘
//! └──────────────────┘                            │
//!                                                 ▼
//!                  ┌──────────────────┐  ┌──────────────────┐
//!                  │ IdentityProvider │  │ StorageProvider  │
//!                  │ - sign-up/in/out │  │ - upload_file    │
//!                  │ - sessions       │  │ - get_url        │
//!                  │ - attributes     │  └──────────────────┘
//!                  │ - hub_events     │
//!                  └──────────────────┘
//! ```
//!
//! This enables:
//! - **Testing**: in-memory mocks (see `composable-identity-testing`)
//! - **Production**: adapters over the managed identity/storage SDK
//!
//! All provider failures are [`ProviderError`](crate::error::ProviderError).

use crate::error::ProviderError;

pub mod identity;
pub mod platform;
pub mod storage;

pub use identity::{
    AuthSession, AuthUser, FetchSessionOptions, IdentityProvider, ResetPasswordOutcome,
    SignInOutcome, SignOutOptions, SignUpOutcome, SignUpRequest,
};
pub use platform::PlatformRuntime;
pub use storage::{AccessLevel, StorageProvider, UploadRequest, UploadResult, UrlResult};

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
