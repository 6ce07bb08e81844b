use {
    anyhow::Result,
    async_trait::async_trait,
    std::{future::Future, time::Duration},
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatAction, ChatId, ParseMode},
    },
    tracing::{debug, warn},
};

use envoy_channels::{ChannelOutbound, FormatHint};

use crate::chunk::{TELEGRAM_MAX_MESSAGE_LEN, chunk_message};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound message sender for Telegram. Addresses are numeric chat ids.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_chunk(&self, to: &str, chat_id: ChatId, chunk: &str, format: FormatHint) -> Result<()> {
        if format == FormatHint::Plain {
            self.with_retry(to, "send message (plain)", || {
                self.bot.send_message(chat_id, chunk).send()
            })
            .await?;
            return Ok(());
        }

        let html = self
            .with_retry(to, "send message (html)", || {
                self.bot
                    .send_message(chat_id, chunk)
                    .parse_mode(ParseMode::Html)
                    .send()
            })
            .await;
        if let Err(e) = html {
            warn!(
                chat_id = to,
                error = %e,
                "telegram HTML send failed, retrying as plain text"
            );
            self.with_retry(to, "send message (plain)", || {
                self.bot.send_message(chat_id, chunk).send()
            })
            .await?;
        }
        Ok(())
    }

    /// Run `request`, sleeping through `RetryAfter` answers up to
    /// [`TELEGRAM_RETRY_AFTER_MAX_RETRIES`] times.
    async fn with_retry<T, F, Fut>(
        &self,
        to: &str,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;
        loop {
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(wait) = retry_after_duration(&err) else {
                return Err(err);
            };
            if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                warn!(
                    chat_id = to,
                    operation,
                    retries,
                    "telegram rate limit persisted after retries"
                );
                return Err(err);
            }
            retries += 1;
            warn!(
                chat_id = to,
                operation,
                retries,
                retry_after_secs = wait.as_secs(),
                "telegram rate limited, waiting before retry"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

fn parse_chat_id(to: &str) -> Result<ChatId> {
    let id = to
        .parse::<i64>()
        .map_err(|e| anyhow::anyhow!("invalid telegram chat id {to:?}: {e}"))?;
    Ok(ChatId(id))
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    async fn send_text(&self, to: &str, text: &str, format: FormatHint) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        let chunks = chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        for chunk in &chunks {
            self.send_chunk(to, chat_id, chunk, format).await?;
        }
        debug!(
            chat_id = to,
            text_len = text.len(),
            chunk_count = chunks.len(),
            ?format,
            "telegram outbound text sent"
        );
        Ok(())
    }

    async fn send_typing(&self, to: &str) -> Result<()> {
        let chat_id = parse_chat_id(to)?;
        self.bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .send()
            .await?;
        Ok(())
    }
}
