use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

use crate::error::{Error, Result};

/// Long-poll timeout used when `telegram.poll_timeout_secs` is not set.
pub const DEFAULT_POLL_TIMEOUT_SECS: u32 = 30;

/// Settings for the bot account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Seconds each `getUpdates` call waits for new updates.
    pub poll_timeout_secs: u32,

    /// Bot API base URL override (self-hosted Bot API servers, tests).
    pub api_url: Option<String>,
}

impl TelegramConfig {
    /// Parse the raw `[telegram]` table and require a token.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone())?;
        if config.token.expose_secret().trim().is_empty() {
            return Err(Error::message("telegram bot token is required"));
        }
        Ok(config)
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            api_url: None,
        }
    }
}
