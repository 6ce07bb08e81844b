//! Config schema types (logging, llm, receivers, sources).
use std::{path::PathBuf, time::Duration};

use {
    secrecy::Secret,
    serde::{Deserialize, Deserializer},
};

/// Model used when `llm.model` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// OpenAI-compatible endpoint used when `llm.base_url` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// System message that opens every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a chatbot having a conversation with a human.";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvoyConfig {
    /// Log verbosity (trace, debug, info, warn, error).
    pub log_level: String,

    /// Raw Telegram channel settings. Parsed by the telegram crate so that
    /// the config crate stays free of transport types.
    pub telegram: serde_json::Value,

    pub llm: LlmConfig,

    /// Aliases (Telegram usernames) allowed to talk to the bot and to
    /// receive summaries.
    pub summary_receivers: Vec<String>,

    /// Chats to scrape and summarize.
    pub sources: Vec<SourceConfig>,
}

impl Default for EnvoyConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            telegram: serde_json::Value::Object(serde_json::Map::new()),
            llm: LlmConfig::default(),
            summary_receivers: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl EnvoyConfig {
    /// Look up a configured source by id.
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/// Language-model backend settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }
}

/// One chat to summarize on a timer.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Identifier used in `/<id>` commands. Integers are accepted and kept
    /// in their decimal form.
    #[serde(deserialize_with = "string_or_int")]
    pub id: String,

    /// Chat reference (`@username` or numeric chat id) the messages are read
    /// from. Defaults to `id`.
    #[serde(default)]
    pub chat: Option<String>,

    /// Window length in seconds; also the interval between runs.
    #[serde(alias = "lookback_seconds")]
    pub lookback_period_seconds: u64,

    /// Prompt template file. Relative paths are resolved against the
    /// directory of the config file.
    #[serde(alias = "prompt_template_path")]
    pub summarization_prompt_path: PathBuf,
}

impl SourceConfig {
    /// The chat this source reads from.
    #[must_use]
    pub fn chat_ref(&self) -> &str {
        self.chat.as_deref().unwrap_or(&self.id)
    }

    #[must_use]
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_period_seconds)
    }
}

fn string_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn defaults() {
        let cfg = EnvoyConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.model, DEFAULT_MODEL);
        assert_eq!(cfg.llm.base_url, DEFAULT_BASE_URL);
        assert!(cfg.sources.is_empty());
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "llm": { "api_key": "sk-test" },
            "summary_receivers": ["alice"],
            "sources": [
                { "id": "news", "lookback_period_seconds": 3600,
                  "summarization_prompt_path": "prompts/news.txt" },
                { "id": -1001234, "chat": "-1001234", "lookback_seconds": 60,
                  "prompt_template_path": "p.txt" }
            ]
        }"#;
        let cfg: EnvoyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.llm.api_key.expose_secret(), "sk-test");
        assert_eq!(cfg.llm.model, DEFAULT_MODEL);
        assert_eq!(cfg.sources[0].chat_ref(), "news");
        assert_eq!(cfg.sources[0].lookback(), Duration::from_secs(3600));
        assert_eq!(cfg.sources[1].id, "-1001234");
        assert_eq!(cfg.sources[1].lookback_period_seconds, 60);
        assert_eq!(
            cfg.source("-1001234").unwrap().summarization_prompt_path,
            PathBuf::from("p.txt")
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = LlmConfig {
            api_key: Secret::new("sk-very-secret".into()),
            ..Default::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("REDACTED"));
    }
}
