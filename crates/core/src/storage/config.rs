//! Storage configuration types.

use crmdesk_shared::config::StorageSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, MinIO, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name as used in configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum receipt size in bytes.
    pub max_file_size: u64,
    /// Allowed receipt MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Create a new storage config with default limits.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Builds a config from the application's storage settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider or an S3
    /// provider with missing credentials.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider.as_str() {
            "local" => StorageProvider::local_fs(&settings.root),
            "s3" => {
                let require = |value: &Option<String>, name: &str| {
                    value
                        .clone()
                        .ok_or_else(|| StorageError::configuration(format!("storage.{name} is required for s3")))
                };
                StorageProvider::s3(
                    require(&settings.endpoint, "endpoint")?,
                    require(&settings.bucket, "bucket")?,
                    require(&settings.access_key_id, "access_key_id")?,
                    require(&settings.secret_access_key, "secret_access_key")?,
                    settings.region.clone().unwrap_or_else(|| "auto".to_string()),
                )
            }
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };
        Ok(Self::new(provider).with_max_file_size(settings.max_file_size))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Receipts are scans, photos, or PDFs.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        ["application/pdf", "image/png", "image/jpeg", "image/gif", "image/webp"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|t| t == mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_local_provider() {
        let config = StorageConfig::from_settings(&StorageSettings::default()).unwrap();
        assert_eq!(config.provider.name(), "local");
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_s3_requires_bucket() {
        let settings = StorageSettings {
            provider: "s3".to_string(),
            endpoint: Some("https://minio.local".to_string()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_s3_from_settings() {
        let settings = StorageSettings {
            provider: "s3".to_string(),
            endpoint: Some("https://minio.local".to_string()),
            bucket: Some("receipts".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..StorageSettings::default()
        };
        let config = StorageConfig::from_settings(&settings).unwrap();
        assert_eq!(config.provider.name(), "s3");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let settings = StorageSettings {
            provider: "ftp".to_string(),
            ..StorageSettings::default()
        };
        assert!(StorageConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_receipt_mime_types() {
        let config = StorageConfig::new(StorageProvider::local_fs("./uploads"));
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(config.is_mime_type_allowed("image/jpeg"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }
}
