//! Object storage provider trait.

use super::ProviderResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;

/// Who may read an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Readable by anyone with the app's guest credentials.
    Guest,
    /// Readable by any signed-in user, writable by the owner.
    Protected,
    /// Readable and writable by the owner only.
    #[default]
    Private,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// File upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Object key.
    pub key: String,
    /// Local file to upload.
    pub local_path: PathBuf,
    /// Access scope.
    pub access_level: AccessLevel,
    /// Object metadata.
    pub metadata: HashMap<String, String>,
}

/// Outcome of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Key the object was stored under.
    pub key: String,
}

/// A time-limited object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResult {
    /// Signed URL.
    pub url: String,
    /// When the URL stops working, if the provider reports it.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Object storage provider.
///
/// Concurrent uploads under the same key are last-writer-wins; callers
/// get no local locking.
pub trait StorageProvider: Send + Sync {
    /// Upload a local file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the transfer fails.
    fn upload_file(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = ProviderResult<UploadResult>> + Send;

    /// Get a signed URL for an object.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn get_url(
        &self,
        key: &str,
        access_level: AccessLevel,
        expires_in: Duration,
    ) -> impl Future<Output = ProviderResult<UrlResult>> + Send;
}
