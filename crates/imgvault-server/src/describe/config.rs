use std::env;

/// Prompt sent with every image.
pub const DEFAULT_PROMPT: &str =
    "Describe this image in one or two short sentences suitable as a caption.";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the HTTP description generator.
#[derive(Debug, Clone)]
pub struct DescriberConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub prompt: String,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
}

impl DescriberConfig {
    /// Defaults: 30s timeout, 120 max tokens, the standard caption prompt.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout_seconds: 30,
            max_tokens: 120,
        }
    }

    /// `None` when `DESCRIBER_ENDPOINT` or `DESCRIBER_API_KEY` is unset, in
    /// which case captions are never generated.
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("DESCRIBER_ENDPOINT").ok().filter(|s| !s.trim().is_empty())?;
        let api_key = env::var("DESCRIBER_API_KEY").ok().filter(|s| !s.trim().is_empty())?;
        let model = env::var("DESCRIBER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let mut config = Self::new(endpoint, model, api_key);
        if let Ok(prompt) = env::var("DESCRIBER_PROMPT") {
            config.prompt = prompt;
        }
        if let Some(timeout) = env::var("DESCRIBER_TIMEOUT").ok().and_then(|s| s.parse().ok()) {
            config.timeout_seconds = timeout;
        }
        if let Some(max_tokens) = env::var("DESCRIBER_MAX_TOKENS").ok().and_then(|s| s.parse().ok()) {
            config.max_tokens = max_tokens;
        }

        Some(config)
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
