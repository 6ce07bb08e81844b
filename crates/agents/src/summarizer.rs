//! Summaries and follow-up chat on top of an [`LlmProvider`].
//!
//! A [`Conversation`] is an append-only transcript. Every call takes the
//! transcript by reference and returns a new one, so the caller decides
//! where the updated state lives.

use std::sync::Arc;

use {
    envoy_config::{LlmConfig, PromptTemplate},
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    model::{ChatMessage, LlmProvider},
    providers::AsyncOpenAiProvider,
};

/// Conversation history, oldest first, opening with the system message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    #[must_use]
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of completed user/assistant exchanges.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| matches!(m, ChatMessage::Assistant(_)))
            .count()
    }

    fn with_turn(&self, input: &str, reply: &str) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.extend_from_slice(&self.messages);
        messages.push(ChatMessage::user(input));
        messages.push(ChatMessage::assistant(reply));
        Self { messages }
    }
}

/// Produces summaries and answers follow-up questions.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    /// Summarizer backed by an OpenAI-compatible endpoint.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let provider = AsyncOpenAiProvider::new(&config.api_key, &config.model, &config.base_url);
        info!(model = %config.model, base_url = %config.base_url, "llm provider ready");
        Self::new(Arc::new(provider), &config.system_prompt)
    }

    /// Summarize serialized history with `template`. The returned
    /// conversation holds the prompt and the summary, ready for follow-ups.
    pub async fn summarize(
        &self,
        history_json: &str,
        template: &PromptTemplate,
    ) -> Result<(String, Conversation)> {
        let conversation = Conversation::new(&self.system_prompt);
        self.predict(&conversation, &template.render(history_json))
            .await
    }

    /// Answer `input` given `conversation`. Returns the reply and the
    /// conversation extended by this exchange; the input is left untouched.
    pub async fn predict(
        &self,
        conversation: &Conversation,
        input: &str,
    ) -> Result<(String, Conversation)> {
        let mut messages = conversation.messages.clone();
        messages.push(ChatMessage::user(input));

        let response = self.provider.complete(&messages).await?;
        let reply = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::EmptyCompletion {
                provider: self.provider.name().to_string(),
            })?;

        debug!(
            provider = self.provider.name(),
            model = self.provider.id(),
            history = messages.len(),
            reply_len = reply.len(),
            "prediction complete"
        );
        let updated = conversation.with_turn(input, &reply);
        Ok((reply, updated))
    }
}
