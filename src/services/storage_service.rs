use crate::{
    config::StorageConfig,
    error::{ApiError, Result},
};
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::Builder as S3ConfigBuilder, presigning::PresigningConfig, Client as S3Client,
};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Access to the bucket holding uploaded training archives.
///
/// Uploads happen elsewhere; this service only hands out time-bound read
/// capabilities for the provider and deletes archives after completion.
pub struct StorageService {
    client: S3Client,
    bucket_name: String,
    signed_url_expiration: Duration,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "CloudflareR2",
        );

        let s3_config = S3ConfigBuilder::new()
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for R2
            .behavior_version_latest()
            .build();

        let client = S3Client::from_conf(s3_config);

        info!(
            "StorageService initialized with bucket: {}, region: {}",
            config.bucket_name, config.region
        );

        Self {
            client,
            bucket_name: config.bucket_name.clone(),
            signed_url_expiration: Duration::from_secs(config.signed_url_expiration_seconds),
        }
    }

    /// Generate a scoped, time-bound read URL for an archive. Never persisted;
    /// the provider must fetch within the validity window.
    #[instrument(skip(self))]
    pub async fn generate_signed_url(&self, key: &str) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(self.signed_url_expiration)
            .map_err(|e| {
                ApiError::Storage(format!("Failed to create presigning config: {}", e))
            })?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                warn!("Failed to generate signed URL for {}: {}", key, e);
                ApiError::Storage(format!("Failed to generate signed URL: {}", e))
            })?;

        info!(
            "Signed URL generated for {} (expires in {}s)",
            key,
            self.signed_url_expiration.as_secs()
        );

        Ok(presigned_request.uri().to_string())
    }

    /// Delete a training archive.
    #[instrument(skip(self))]
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to delete object {}: {}", key, e);
                ApiError::Storage(format!("Failed to delete object: {}", e))
            })?;

        info!("Deleted training archive: {}", key);

        Ok(())
    }
}
