//! Image description generator
//!
//! Captions are best-effort. A [`DescriptionGenerator`] may fail for any
//! reason; the pipeline collapses the result into a [`Description`] and never
//! lets the failure travel further.

use async_trait::async_trait;
use imgvault_common::DESCRIPTION_UNAVAILABLE;
use tracing::warn;

pub mod config;
pub mod http;

pub use config::DescriberConfig;
pub use http::HttpDescriptionGenerator;

#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("description request timed out after {0}s")]
    Timeout(u64),

    #[error("description API error: {0}")]
    Api(String),

    #[error("failed to parse description response: {0}")]
    Parse(String),

    #[error("description generator not configured: {0}")]
    Configuration(String),
}

/// Produces a short caption for raw image bytes.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn describe(&self, image: &[u8], content_type: &str) -> Result<String, DescribeError>;
}

/// Outcome of one caption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    Generated(String),
    Unavailable,
}

impl Description {
    /// Collapse a generator result; errors and blank captions become
    /// [`Description::Unavailable`].
    pub fn from_result(result: Result<String, DescribeError>) -> Self {
        match result {
            Ok(text) if !text.trim().is_empty() => Description::Generated(text.trim().to_string()),
            Ok(_) => {
                warn!("Description generator returned an empty caption");
                Description::Unavailable
            },
            Err(e) => {
                warn!(error = %e, "Description unavailable");
                Description::Unavailable
            },
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Description::Generated(_))
    }

    /// The caption, or the sentinel text when none was produced.
    pub fn into_text(self) -> String {
        match self {
            Description::Generated(text) => text,
            Description::Unavailable => DESCRIPTION_UNAVAILABLE.to_string(),
        }
    }
}

/// Stand-in used when no description service is configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredDescriptionGenerator;

#[async_trait]
impl DescriptionGenerator for UnconfiguredDescriptionGenerator {
    async fn describe(&self, _image: &[u8], _content_type: &str) -> Result<String, DescribeError> {
        Err(DescribeError::Configuration(
            "set DESCRIBER_ENDPOINT and DESCRIBER_API_KEY".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_caption_is_trimmed() {
        let description = Description::from_result(Ok("  A cat on a mat. \n".to_string()));
        assert_eq!(description, Description::Generated("A cat on a mat.".to_string()));
        assert!(description.is_generated());
        assert_eq!(description.into_text(), "A cat on a mat.");
    }

    #[test]
    fn test_error_becomes_sentinel() {
        let description = Description::from_result(Err(DescribeError::Timeout(30)));
        assert_eq!(description, Description::Unavailable);
        assert_eq!(description.into_text(), "Description unavailable");
    }

    #[test]
    fn test_blank_caption_becomes_sentinel() {
        let description = Description::from_result(Ok("   ".to_string()));
        assert!(!description.is_generated());
        assert_eq!(description.into_text(), DESCRIPTION_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unconfigured_generator_always_fails() {
        let result = UnconfiguredDescriptionGenerator.describe(b"img", "image/png").await;
        assert!(matches!(result, Err(DescribeError::Configuration(_))));
    }
}
