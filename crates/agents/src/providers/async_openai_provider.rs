use {
    async_openai::{
        config::OpenAIConfig,
        types::chat::{
            ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
            ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
            CreateChatCompletionRequestArgs,
        },
    },
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::model::{ChatMessage, CompletionResponse, LlmProvider, Usage};

/// Provider backed by the `async-openai` crate.
/// Works with OpenAI and any OpenAI-compatible API (Ollama, vLLM, etc.)
/// via custom base URL.
pub struct AsyncOpenAiProvider {
    model: String,
    client: async_openai::Client<OpenAIConfig>,
}

impl AsyncOpenAiProvider {
    pub fn new(api_key: &Secret<String>, model: impl Into<String>, base_url: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url.trim_end_matches('/'));
        Self {
            model: model.into(),
            client: async_openai::Client::with_config(config),
        }
    }
}

fn build_messages(messages: &[ChatMessage]) -> anyhow::Result<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|msg| {
            Ok(match msg {
                ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                    .content(content.as_str())
                    .build()?
                    .into(),
                ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.as_str())
                    .build()?
                    .into(),
                ChatMessage::Assistant(content) => {
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content.as_str())
                        .build()?
                        .into()
                },
            })
        })
        .collect()
}

#[async_trait]
impl LlmProvider for AsyncOpenAiProvider {
    fn name(&self) -> &str {
        "async-openai"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<CompletionResponse> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(build_messages(messages)?)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone());

        let usage = response
            .usage
            .as_ref()
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            model = %self.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion finished"
        );

        Ok(CompletionResponse { text, usage })
    }
}
