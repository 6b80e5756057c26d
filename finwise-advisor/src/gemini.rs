use anyhow::{anyhow, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client as OpenAiClient,
};
use async_trait::async_trait;

use crate::gateway::TextCompletion;

/// Gemini's OpenAI-compatible endpoint.
const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Configuration for the Gemini completion client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: GEMINI_OPENAI_BASE.to_string(),
            model: "gemini-1.5-flash".to_string(),
            max_tokens: 800,
            temperature: 0.7,
        }
    }
}

/// Completion client for Gemini, speaking the OpenAI chat wire format.
pub struct GeminiCompletion {
    client: OpenAiClient<OpenAIConfig>,
    config: GeminiConfig,
}

impl GeminiCompletion {
    pub fn new(config: GeminiConfig, api_key: String) -> Self {
        tracing::info!(
            "Initializing Gemini client: model={}, api_base={}",
            config.model,
            config.api_base
        );

        let openai_config = OpenAIConfig::new()
            .with_api_base(config.api_base.clone())
            .with_api_key(api_key);

        Self {
            client: OpenAiClient::with_config(openai_config),
            config,
        }
    }
}

#[async_trait]
impl TextCompletion for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| anyhow!("Gemini API error: {}", e))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("empty completion from Gemini"))
    }
}
