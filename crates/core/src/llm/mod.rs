pub mod error;
pub mod gemini;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Data-grounded market chat.
    pub const CHAT: Self = Self {
        temperature: 0.7,
        top_k: Some(40),
        top_p: Some(0.95),
        max_output_tokens: 2048,
    };

    /// Plain conversational assistant.
    pub const PLAIN: Self = Self {
        temperature: 0.8,
        top_k: None,
        top_p: None,
        max_output_tokens: 1024,
    };
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// One non-streaming completion. No retries.
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> anyhow::Result<String>;
}
