//! MinIO/S3-compatible storage client
//!
//! Signs upload and download URLs and reads object metadata for
//! integrity checks. Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::object_store::{ObjectStat, ObjectStore};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration and make sure the
    /// attachment bucket exists.
    pub async fn new(config: &MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.clone(),
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}",
            client.endpoint,
            client.bucket_name()
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let bucket_name = self.bucket_name();

        match Bucket::create_with_path_style(
            &bucket_name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(response) if response.success() => {
                info!("Bucket '{}' created successfully", bucket_name);
                Ok(())
            }
            Ok(response) => {
                // 409 BucketAlreadyOwnedByYou lands here with fail-on-err disabled
                debug!(
                    "Bucket '{}' not created (status {}), assuming it exists",
                    bucket_name, response.response_code
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Could not create bucket '{}': {}. Assuming it exists.",
                    bucket_name, e
                );
                Ok(())
            }
        }
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String> {
        self.bucket
            .presign_put(key, expiry_secs, None, None)
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to generate upload URL for '{}': {}",
                    key, e
                ))
            })
    }

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String> {
        self.bucket
            .presign_get(key, expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    key, e
                ))
            })
    }

    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>> {
        let (head, status) = self.bucket.head_object(key).await.map_err(|e| {
            AppError::Internal(format!("Failed to read metadata of '{}': {}", key, e))
        })?;

        debug!(
            "Stat '{}' in bucket '{}': status={} etag={:?} size={:?}",
            key,
            self.bucket_name(),
            status,
            head.e_tag,
            head.content_length
        );

        stat_from_head(key, status, head.e_tag, head.content_length)
    }
}

/// Map a HEAD response onto an object stat. 404 means the object is absent.
fn stat_from_head(
    key: &str,
    status: u16,
    e_tag: Option<String>,
    content_length: Option<i64>,
) -> Result<Option<ObjectStat>> {
    match status {
        404 => Ok(None),
        200..=299 => Ok(Some(ObjectStat {
            e_tag,
            content_length,
        })),
        _ => Err(AppError::Internal(format!(
            "Unexpected status {} reading metadata of '{}'",
            status, key
        ))),
    }
}
