use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{config::DescriberConfig, DescribeError, DescriptionGenerator};

/// Captions images through an OpenAI-compatible chat completions API with
/// vision input.
#[derive(Debug)]
pub struct HttpDescriptionGenerator {
    client: reqwest::Client,
    config: DescriberConfig,
}

impl HttpDescriptionGenerator {
    pub fn new(config: DescriberConfig) -> Result<Self, DescribeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DescribeError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, image: &[u8], content_type: &str) -> serde_json::Value {
        let data_url = format!("data:{};base64,{}", content_type, STANDARD.encode(image));

        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": self.config.prompt },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        })
    }

    fn extract_caption(body: &serde_json::Value) -> Result<String, DescribeError> {
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| DescribeError::Parse(format!("unexpected response format: {body}")))
    }
}

#[async_trait]
impl DescriptionGenerator for HttpDescriptionGenerator {
    #[instrument(skip(self, image), fields(size = image.len(), model = %self.config.model))]
    async fn describe(&self, image: &[u8], content_type: &str) -> Result<String, DescribeError> {
        let request_body = self.build_request(image, content_type);

        debug!(endpoint = %self.config.endpoint, "Sending description request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DescribeError::Timeout(self.config.timeout_seconds)
                } else {
                    DescribeError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Description API returned error");
            return Err(DescribeError::Api(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DescribeError::Parse(format!("failed to parse API response: {e}")))?;

        Self::extract_caption(&body)
    }
}
