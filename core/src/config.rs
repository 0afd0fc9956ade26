//! Configuration for the platform runtime and the session coordinator.
//!
//! Configuration values are provided by the application. [`PlatformConfig`]
//! can also be loaded from environment variables.
//!
//! # Example
//!
//! ```no_run
//! use composable_identity_core::config::{CoordinatorConfig, PlatformConfig};
//! use chrono::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = PlatformConfig::from_env()?;
//! let coordinator = CoordinatorConfig::default()
//!     .with_url_expiry(Duration::minutes(15));
//! coordinator.validate()?;
//! # Ok(())
//! # }
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the service region.
pub const ENV_REGION: &str = "IDENTITY_REGION";
/// Environment variable holding the user pool id.
pub const ENV_USER_POOL_ID: &str = "IDENTITY_USER_POOL_ID";
/// Environment variable holding the user pool app client id.
pub const ENV_USER_POOL_CLIENT_ID: &str = "IDENTITY_USER_POOL_CLIENT_ID";
/// Environment variable holding the identity pool id (optional).
pub const ENV_IDENTITY_POOL_ID: &str = "IDENTITY_POOL_ID";
/// Environment variable holding the storage bucket name.
pub const ENV_STORAGE_BUCKET: &str = "IDENTITY_STORAGE_BUCKET";

/// Configuration error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Settings handed to the platform runtime at configure time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Service region (e.g., "eu-west-1").
    pub region: String,
    /// User pool id.
    pub user_pool_id: String,
    /// User pool app client id.
    pub user_pool_client_id: String,
    /// Identity pool id, needed for storage credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_pool_id: Option<String>,
    /// Storage bucket name.
    pub bucket: String,
}

impl PlatformConfig {
    /// Create a configuration.
    #[must_use]
    pub const fn new(
        region: String,
        user_pool_id: String,
        user_pool_client_id: String,
        bucket: String,
    ) -> Self {
        Self {
            region,
            user_pool_id,
            user_pool_client_id,
            identity_pool_id: None,
            bucket,
        }
    }

    /// Set the identity pool id.
    #[must_use]
    pub fn with_identity_pool_id(mut self, identity_pool_id: impl Into<String>) -> Self {
        self.identity_pool_id = Some(identity_pool_id.into());
        self
    }

    /// Load configuration from `IDENTITY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| ConfigError::EnvVarNotSet(name.to_string()))
        };

        let mut config = Self::new(
            required(ENV_REGION)?,
            required(ENV_USER_POOL_ID)?,
            required(ENV_USER_POOL_CLIENT_ID)?,
            required(ENV_STORAGE_BUCKET)?,
        );
        if let Ok(identity_pool_id) = std::env::var(ENV_IDENTITY_POOL_ID) {
            config.identity_pool_id = Some(identity_pool_id);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a required field is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("region", &self.region),
            ("user_pool_id", &self.user_pool_id),
            ("user_pool_client_id", &self.user_pool_client_id),
            ("bucket", &self.bucket),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} cannot be empty"
                )));
            }
        }
        if self
            .identity_pool_id
            .as_ref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "identity_pool_id cannot be empty when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the JSON document the platform runtime consumes.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Session coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Lifetime of URLs returned by `get_url`.
    ///
    /// Default: 1 hour
    pub url_expiry: Duration,

    /// Description stored in the metadata of every upload.
    ///
    /// Default: "profile photo"
    pub upload_description: String,
}

impl CoordinatorConfig {
    /// Set the URL expiry window.
    #[must_use]
    pub const fn with_url_expiry(mut self, expiry: Duration) -> Self {
        self.url_expiry = expiry;
        self
    }

    /// Set the upload description.
    #[must_use]
    pub fn with_upload_description(mut self, description: impl Into<String>) -> Self {
        self.upload_description = description.into();
        self
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the expiry is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_expiry <= Duration::zero() {
            return Err(ConfigError::ValidationError(
                "url_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            url_expiry: Duration::hours(1),
            upload_description: "profile photo".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn platform() -> PlatformConfig {
        PlatformConfig::new(
            "eu-west-1".to_string(),
            "eu-west-1_pool".to_string(),
            "client".to_string(),
            "avatars".to_string(),
        )
    }

    #[test]
    fn test_platform_config_validation() {
        let mut config = platform();
        assert!(config.validate().is_ok());

        config.region = "  ".to_string();
        assert!(config.validate().is_err());

        let config = platform().with_identity_pool_id("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_platform_config_json() {
        let json = platform()
            .with_identity_pool_id("eu-west-1:pool")
            .to_json()
            .unwrap();
        assert!(json.contains("\"userPoolId\":\"eu-west-1_pool\""));
        assert!(json.contains("\"identityPoolId\":\"eu-west-1:pool\""));
    }

    #[test]
    fn test_coordinator_config_builder() {
        let config = CoordinatorConfig::default()
            .with_url_expiry(Duration::minutes(5))
            .with_upload_description("avatar");

        assert_eq!(config.url_expiry, Duration::minutes(5));
        assert_eq!(config.upload_description, "avatar");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_coordinator_config_validation() {
        assert!(CoordinatorConfig::default().validate().is_ok());
        assert!(
            CoordinatorConfig::default()
                .with_url_expiry(Duration::zero())
                .validate()
                .is_err()
        );
    }
}
