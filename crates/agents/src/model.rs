use {async_trait::async_trait, serde::Serialize};

// ── Typed chat messages ─────────────────────────────────────────────────────

/// Typed chat message for the LLM provider interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::System(c) | Self::User(c) | Self::Assistant(c) => c,
        }
    }
}

/// LLM provider trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier.
    fn id(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<CompletionResponse>;
}

#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_and_content() {
        assert_eq!(ChatMessage::system("s"), ChatMessage::System("s".into()));
        assert_eq!(ChatMessage::user("u").content(), "u");
        assert_eq!(ChatMessage::assistant("a").content(), "a");
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(ChatMessage::user("hello")).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hello" }));
    }
}
