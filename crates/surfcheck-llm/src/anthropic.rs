//! Anthropic Messages API backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_client::HttpClient;
use crate::{CompletionRequest, LlmClient, ModelTier};
use surfcheck_utils::error::LlmError;

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model resolved for [`ModelTier::Fast`]
const DEFAULT_FAST_MODEL: &str = "claude-3-5-haiku-latest";

/// Default model resolved for [`ModelTier::Capable`]
const DEFAULT_CAPABLE_MODEL: &str = "claude-sonnet-4-5";

/// Anthropic backend for [`LlmClient`].
#[derive(Clone)]
pub struct AnthropicClient {
    client: HttpClient,
    base_url: String,
    api_key: String,
    fast_model: String,
    capable_model: String,
}

impl AnthropicClient {
    /// Create a backend with the default endpoint and model mapping.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the key is empty or the
    /// HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::Misconfiguration(
                "Anthropic API key is empty".to_string(),
            ));
        }

        Ok(Self {
            client: HttpClient::new()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            capable_model: DEFAULT_CAPABLE_MODEL.to_string(),
        })
    }

    /// Override the endpoint (test seam and proxy support).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-tier model mapping.
    #[must_use]
    pub fn with_models(
        mut self,
        fast: impl Into<String>,
        capable: impl Into<String>,
    ) -> Self {
        self.fast_model = fast.into();
        self.capable_model = capable.into();
        self
    }

    fn resolve_model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Capable => &self.capable_model,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let model = self.resolve_model(request.tier).to_string();

        debug!(
            model = %model,
            max_tokens = request.max_tokens,
            timeout_secs = request.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let body = MessagesRequest {
            model: model.clone(),
            max_tokens: request.max_tokens,
            system: request.system.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        };

        let request_builder = reqwest::Client::new()
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request_builder, request.timeout)
            .await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse response: {e}")))?;

        let content: String = parsed
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!(
            tokens_input = ?parsed.usage.as_ref().map(|u| u.input_tokens),
            tokens_output = ?parsed.usage.as_ref().map(|u| u.output_tokens),
            "Anthropic invocation completed"
        );

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
