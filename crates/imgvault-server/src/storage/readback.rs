//! Read-after-write verification
//!
//! After a blob is written the pipeline fetches it back through its public URL.
//! This proves the URL that will be stored in the metadata record actually
//! resolves, and yields the bytes handed to the description generator.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, thiserror::Error)]
pub enum ReadbackError {
    #[error("readback request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("readback request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("readback of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("readback of {url} returned an empty body")]
    Empty { url: String },

    #[error("readback client configuration error: {0}")]
    Configuration(String),
}

/// Fetches a stored blob by its public URL.
#[async_trait]
pub trait BlobReader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReadbackError>;
}

#[derive(Debug, Clone)]
pub struct HttpBlobReader {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpBlobReader {
    pub fn new(timeout_secs: u64) -> Result<Self, ReadbackError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReadbackError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl BlobReader for HttpBlobReader {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReadbackError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ReadbackError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout_secs,
                }
            } else {
                ReadbackError::Http {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadbackError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ReadbackError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if bytes.is_empty() {
            return Err(ReadbackError::Empty {
                url: url.to_string(),
            });
        }

        debug!(size = bytes.len(), "Fetched blob back from public URL");
        Ok(bytes.to_vec())
    }
}
