//! Receipt storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use serde::Serialize;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Metadata about a stored receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptMetadata {
    /// Storage key.
    pub storage_key: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Content type.
    pub content_type: Option<String>,
}

/// Storage service for expense receipts.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(operator)
    }

    /// Validate a receipt against the size and MIME type limits.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::InvalidMimeType {
                mime_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Storage key for a receipt: `receipts/{expense_id}/{sanitized_filename}`.
    #[must_use]
    pub fn receipt_key(expense_id: Uuid, filename: &str) -> String {
        format!("receipts/{expense_id}/{}", sanitize_filename(filename))
    }

    /// Validates and writes a receipt, returning where it was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the write fails.
    pub async fn put_receipt(
        &self,
        expense_id: Uuid,
        filename: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<ReceiptMetadata, StorageError> {
        let size = u64::try_from(body.len()).unwrap_or(u64::MAX);
        self.validate_upload(content_type, size)?;

        let key = Self::receipt_key(expense_id, filename);
        self.operator
            .write_with(&key, body)
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;

        Ok(ReceiptMetadata {
            storage_key: key,
            file_size: size,
            content_type: Some(content_type.to_string()),
        })
    }

    /// Reads a stored receipt.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing is stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;
        Ok(buffer.to_bytes())
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

/// Only ASCII alphanumerics, dots, hyphens, and underscores survive; a name
/// that sanitizes to nothing but dots becomes `receipt`.
fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "receipt".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_service(dir: &str) -> StorageService {
        let root = std::env::temp_dir().join(dir);
        StorageService::from_config(
            StorageConfig::new(StorageProvider::local_fs(root)).with_max_file_size(1024),
        )
        .expect("should create service")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("receipt.pdf"), "receipt.pdf");
        assert_eq!(sanitize_filename("taxi ride (1).jpg"), "taxi_ride__1_.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(".."), "receipt");
        assert_eq!(sanitize_filename(""), "receipt");
    }

    #[test]
    fn test_receipt_key_layout() {
        let id = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
        assert_eq!(
            StorageService::receipt_key(id, "hotel bill.pdf"),
            "receipts/6ba7b810-9dad-11d1-80b4-00c04fd430c8/hotel_bill.pdf"
        );
    }

    #[test]
    fn test_validate_upload() {
        let service = local_service("crmdesk-validate");
        assert!(service.validate_upload("application/pdf", 512).is_ok());
        assert!(matches!(
            service.validate_upload("application/pdf", 2048),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            service.validate_upload("application/x-executable", 10),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_put_read_delete_receipt() {
        let service = local_service("crmdesk-receipts");
        let expense_id = Uuid::now_v7();

        let meta = service
            .put_receipt(expense_id, "lunch.png", "image/png", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();
        assert_eq!(meta.file_size, 9);
        assert!(service.exists(&meta.storage_key).await);

        let body = service.read(&meta.storage_key).await.unwrap();
        assert_eq!(body.as_ref(), b"png-bytes");

        service.delete(&meta.storage_key).await.unwrap();
        assert!(!service.exists(&meta.storage_key).await);
    }

    #[tokio::test]
    async fn test_oversized_receipt_not_written() {
        let service = local_service("crmdesk-oversized");
        let expense_id = Uuid::now_v7();
        let err = service
            .put_receipt(expense_id, "big.pdf", "application/pdf", Bytes::from(vec![0u8; 2048]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
        assert!(
            !service
                .exists(&StorageService::receipt_key(expense_id, "big.pdf"))
                .await
        );
    }
}
