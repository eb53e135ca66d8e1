//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the hosted chat-completion model.
//! It implements the `ModelGateway` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use document_assistant_core::ports::{CompletionRequest, ModelGateway, PortError, PortResult};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ModelGateway` using an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct OpenAiChatGateway {
    client: Client<OpenAIConfig>,
}

impl OpenAiChatGateway {
    /// Creates a new `OpenAiChatGateway`.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    /// Builds a client for the given key, optionally pointed at a compatible API base.
    pub fn from_api_key(api_key: &str, api_base: Option<&str>) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            openai_config = openai_config.with_api_base(base);
        }
        Self::new(Client::with_config(openai_config))
    }
}

//=========================================================================================
// `ModelGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl ModelGateway for OpenAiChatGateway {
    /// Sends a system/user message pair and returns the first choice's text.
    async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
        debug!(
            model = %request.model,
            max_output_tokens = request.max_output_tokens,
            "Sending chat completion request"
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_instruction)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(request.model.as_str())
            .messages(messages)
            .max_completion_tokens(request.max_output_tokens)
            .temperature(request.temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // OpenAIError is foreign to the core crate, so it is mapped here.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(PortError::EmptyResponse)
    }
}
