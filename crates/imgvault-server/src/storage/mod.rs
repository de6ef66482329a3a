//! Object store gateway
//!
//! [`ObjectStore`] is the seam the ingestion pipeline writes blobs through.
//! [`Storage`] implements it on top of any S3-compatible service (AWS, MinIO).

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info, instrument};

pub mod config;
pub mod readback;

pub use readback::{BlobReader, HttpBlobReader, ReadbackError};

/// Failure of a single object store call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("object store {operation} failed for '{key}': {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub key: String,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Blob store addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `content` under `key`. Existing blobs are overwritten, so the
    /// caller is responsible for key uniqueness.
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Remove the blob at `key`.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Public location of `key`.
    fn public_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl Storage {
    pub fn new(config: config::StorageConfig) -> Self {
        debug!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            path_style = config.path_style,
            "Initializing object storage"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "imgvault-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, public_url = %config.public_url, "Storage client initialized");

        Self {
            client,
            bucket: config.bucket,
            public_base_url: config.public_url,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) {
                    Ok(false)
                } else {
                    Err(StoreError::new("head", key, DisplayErrorContext(&e).to_string()))
                }
            },
        }
    }
}

#[async_trait]
impl ObjectStore for Storage {
    #[instrument(skip(self, content), fields(bucket = %self.bucket, size = content.len()))]
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        let checksum = calculate_sha256(&content);
        let size = content.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| StoreError::new("put", key, DisplayErrorContext(&e).to_string()))?;

        info!(key = %key, size, checksum = %checksum, "Uploaded blob");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::new("delete", key, DisplayErrorContext(&e).to_string()))?;

        info!(key = %key, "Deleted blob");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base_url, key)
    }
}

/// `{base}/{key}`, percent-encoding each key segment.
pub fn join_public_url(base: &str, key: &str) -> String {
    if let Ok(mut url) = reqwest::Url::parse(base) {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(key.split('/'));
        }
        if !url.cannot_be_a_base() {
            return url.to_string();
        }
    }
    format!("{}/{}", base.trim_end_matches('/'), key)
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
