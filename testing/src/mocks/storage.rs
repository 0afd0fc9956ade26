//! In-memory object storage.

use composable_identity_core::error::ProviderError;
use composable_identity_core::providers::{
    AccessLevel, ProviderResult, StorageProvider, UploadRequest, UploadResult, UrlResult,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Base of the URLs handed out by [`MockStorageProvider::get_url`].
pub const MOCK_STORAGE_BASE_URL: &str = "https://storage.test";

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, UploadRequest>,
    url_requests: Vec<(String, AccessLevel, Duration)>,
    upload_failure: Option<ProviderError>,
    url_failure: Option<ProviderError>,
}

/// Mock storage provider.
///
/// Stores upload requests by key (last writer wins) without touching the
/// file system and signs URLs as `https://storage.test/{access}/{key}?expires={seconds}`.
#[derive(Debug, Clone, Default)]
pub struct MockStorageProvider {
    state: Arc<Mutex<State>>,
}

#[allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
impl MockStorageProvider {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make uploads fail with `message`.
    pub fn fail_uploads(&self, message: &str) {
        self.state().upload_failure = Some(ProviderError::service(message));
    }

    /// Make URL requests fail with `message`.
    pub fn fail_urls(&self, message: &str) {
        self.state().url_failure = Some(ProviderError::service(message));
    }

    /// The request stored under `key`, if any.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<UploadRequest> {
        self.state().objects.get(key).cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    /// URL requests received so far as `(key, access, expiry)`.
    #[must_use]
    pub fn url_requests(&self) -> Vec<(String, AccessLevel, Duration)> {
        self.state().url_requests.clone()
    }
}

impl StorageProvider for MockStorageProvider {
    fn upload_file(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = ProviderResult<UploadResult>> + Send {
        let result = {
            let mut state = self.state();
            match state.upload_failure.clone() {
                Some(error) => Err(error),
                None => {
                    let key = request.key.clone();
                    state.objects.insert(key.clone(), request);
                    Ok(UploadResult { key })
                }
            }
        };
        async move { result }
    }

    fn get_url(
        &self,
        key: &str,
        access_level: AccessLevel,
        expires_in: Duration,
    ) -> impl Future<Output = ProviderResult<UrlResult>> + Send {
        let result = {
            let mut state = self.state();
            state
                .url_requests
                .push((key.to_string(), access_level, expires_in));
            match state.url_failure.clone() {
                Some(error) => Err(error),
                None => Ok(UrlResult {
                    url: format!(
                        "{MOCK_STORAGE_BASE_URL}/{access_level}/{key}?expires={}",
                        expires_in.num_seconds()
                    ),
                    expires_at: Some(Utc::now() + expires_in),
                }),
            }
        };
        async move { result }
    }
}
