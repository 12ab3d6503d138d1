//! LLM backend abstraction for surfcheck
//!
//! The engine drives four distinct conversations (applicability check,
//! planning, navigation reasoning, code generation) through one narrow
//! capability: complete a prompt into text. Providers implement
//! [`LlmClient`] so the engine never knows transport details, and the
//! provider is treated as unreliable and non-deterministic by contract.

mod anthropic;
pub(crate) mod http_client;

pub use anthropic::AnthropicClient;
pub use surfcheck_utils::error::LlmError;

use std::time::Duration;

use async_trait::async_trait;

/// Model tier requested for one completion.
///
/// Tiers keep the engine free of provider-specific model ids; the
/// backend resolves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap and quick; applicability checks
    Fast,
    /// Stronger reasoning; planning and code generation
    Capable,
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system prompt
    pub system: Option<String>,
    /// User prompt text
    pub prompt: String,
    /// Output token budget for this purpose
    pub max_tokens: u32,
    pub tier: ModelTier,
    pub timeout: Duration,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_tokens: u32, tier: ModelTier) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            tier,
            timeout: Duration::from_secs(120),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Trait for LLM backend implementations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a prompt into raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] for transport failures, provider errors
    /// (auth, quota, outages), timeouts, and empty responses.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
