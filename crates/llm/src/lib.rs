//! LLM client abstraction for cardlab
//!
//! Provides a unified interface for OpenAI-compatible chat providers
//! (OpenAI, x.ai, Ollama behind an OpenAI-compatible endpoint).

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (anything OpenAI-compatible)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model to use for chat completions
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (optional if using env var or local provider)
    pub api_key: Option<String>,
    /// Base URL override (for custom endpoints, e.g. https://api.x.ai/v1)
    pub base_url: Option<String>,
    /// Sampling temperature; leave unset for the provider default
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "grok-4".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: None,
        }
    }
}

/// A message in a chat conversation
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Seam between the judge and the actual provider, so tests can script
/// responses without a network.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Simple completion with a system prompt and user message
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// LLM client abstraction
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Generate a chat completion
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        match self.config.provider.as_str() {
            "openai" => self.chat_openai(messages).await,
            provider => anyhow::bail!("Unsupported LLM provider: {}", provider),
        }
    }

    async fn chat_openai(&self, messages: Vec<Message>) -> Result<String> {
        let mut openai_config = OpenAIConfig::new();

        if let Some(api_key) = &self.config.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }

        if let Some(base_url) = &self.config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = OpenAIClient::with_config(openai_config);

        let openai_messages: Vec<ChatCompletionRequestMessage> = messages
            .into_iter()
            .map(|msg| match msg.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .unwrap()
                    .into(),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .unwrap()
                    .into(),
            })
            .collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.config.model).messages(openai_messages);
        if let Some(temperature) = self.config.temperature {
            builder.temperature(temperature);
        }
        let request = builder
            .build()
            .context("Failed to build chat completion request")?;

        let response = client
            .chat()
            .create(request)
            .await
            .context("Failed to create chat completion")?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the configured provider name
    pub fn provider(&self) -> &str {
        &self.config.provider
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat(vec![Message::system(system), Message::user(user)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "grok-4");
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_message_builders() {
        let sys = Message::system("You are an evaluator");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are an evaluator");

        let user = Message::user("Hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "Hello");
    }
}
