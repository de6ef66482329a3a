use serde::{Deserialize, Serialize};
use std::env;

/// Default bucket for image blobs.
pub const DEFAULT_BUCKET: &str = "imgvault-images";

/// Default region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default timeout for the read-after-write verification fetch.
pub const DEFAULT_READBACK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub path_style: bool,
    /// Base URL under which stored keys are publicly resolvable.
    pub public_url: String,
    pub readback_timeout_secs: u64,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = env::var("S3_ENDPOINT").ok();
        let region = env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let bucket = env::var("S3_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());
        let path_style = env::var("S3_PATH_STYLE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(endpoint.is_some());

        let public_url = env::var("S3_PUBLIC_URL").unwrap_or_else(|_| {
            default_public_url(endpoint.as_deref(), &region, &bucket, path_style)
        });

        let config = Self {
            endpoint,
            region,
            bucket,
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_else(|_| "minioadmin".to_string()),
            path_style,
            public_url,
            readback_timeout_secs: env::var("S3_READBACK_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_READBACK_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let bucket = bucket.into();
        Self {
            public_url: default_public_url(Some(&endpoint), DEFAULT_REGION, &bucket, true),
            endpoint: Some(endpoint),
            region: DEFAULT_REGION.to_string(),
            bucket,
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
            readback_timeout_secs: DEFAULT_READBACK_TIMEOUT_SECS,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.trim().is_empty() {
            anyhow::bail!("S3 bucket cannot be empty");
        }
        let url = reqwest::Url::parse(&self.public_url)
            .map_err(|e| anyhow::anyhow!("Invalid S3 public URL '{}': {}", self.public_url, e))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("S3 public URL '{}' cannot be used as a base URL", self.public_url);
        }
        if self.readback_timeout_secs == 0 {
            anyhow::bail!("S3 readback timeout must be greater than 0");
        }
        Ok(())
    }
}

fn default_public_url(endpoint: Option<&str>, region: &str, bucket: &str, path_style: bool) -> String {
    match endpoint {
        Some(endpoint) if path_style => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}
