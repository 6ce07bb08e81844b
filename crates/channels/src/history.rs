//! Chat history for summarization.
//!
//! A bot cannot page back through a chat, so history is captured as it
//! arrives: the channel records every text message from a watched chat into
//! a [`HistoryBuffer`], which then answers [`HistoryClient`] queries for the
//! last lookback window.

use std::{
    collections::{HashMap, VecDeque},
    sync::RwLock,
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, TimeDelta, Utc},
    serde::Serialize,
    tracing::{debug, trace},
};

use crate::{Error, Result};

/// Upper bound on messages kept per source.
pub const MAX_MESSAGES_PER_SOURCE: usize = 10_000;

/// One message in the structured form handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMessage {
    pub id: i64,
    #[serde(rename = "datetime")]
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(rename = "sender_user_name")]
    pub sender_name: String,
    #[serde(rename = "sender_user_id")]
    pub sender_id: Option<i64>,
    pub is_reply: bool,
    #[serde(
        rename = "reply_to_message_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub reply_to_id: Option<i64>,
}

/// Messages of one source within a window, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHistory {
    pub title: String,
    pub messages: Vec<HistoryMessage>,
}

impl MessageHistory {
    /// Serialize as `{"messages": [...]}`.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            messages: &'a [HistoryMessage],
        }
        Ok(serde_json::to_string(&Envelope {
            messages: &self.messages,
        })?)
    }
}

/// Fetches recent chat history for a source.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    async fn get_message_history(&self, source_id: &str, lookback: Duration)
    -> Result<MessageHistory>;
}

/// A source to record, as configured.
#[derive(Debug, Clone)]
pub struct WatchedSource {
    pub id: String,
    /// `@username`, bare username, or numeric chat id.
    pub chat_ref: String,
    pub lookback: Duration,
}

/// The chat a message arrived in.
#[derive(Debug, Clone, Copy)]
pub struct ChatInfo<'a> {
    pub id: i64,
    pub username: Option<&'a str>,
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatRef {
    Id(i64),
    Username(String),
}

impl ChatRef {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Username(raw.trim_start_matches('@').to_lowercase()),
        }
    }

    fn matches(&self, chat: &ChatInfo<'_>) -> bool {
        match self {
            Self::Id(id) => *id == chat.id,
            Self::Username(name) => chat
                .username
                .is_some_and(|u| u.trim_start_matches('@').eq_ignore_ascii_case(name)),
        }
    }
}

#[derive(Debug)]
struct SourceLog {
    chat: ChatRef,
    chat_ref: String,
    retention: Duration,
    title: Option<String>,
    messages: VecDeque<HistoryMessage>,
}

impl SourceLog {
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = cutoff(now, self.retention);
        while self.messages.front().is_some_and(|m| m.timestamp < cutoff) {
            self.messages.pop_front();
        }
        while self.messages.len() > MAX_MESSAGES_PER_SOURCE {
            self.messages.pop_front();
        }
    }
}

/// In-memory, bounded history of every watched chat.
#[derive(Debug)]
pub struct HistoryBuffer {
    sources: RwLock<HashMap<String, SourceLog>>,
}

impl HistoryBuffer {
    pub fn new(sources: impl IntoIterator<Item = WatchedSource>) -> Self {
        let sources = sources
            .into_iter()
            .map(|s| {
                (s.id, SourceLog {
                    chat: ChatRef::parse(&s.chat_ref),
                    chat_ref: s.chat_ref,
                    retention: s.lookback,
                    title: None,
                    messages: VecDeque::new(),
                })
            })
            .collect();
        Self {
            sources: RwLock::new(sources),
        }
    }

    /// `true` if any source records messages from this chat.
    pub fn watches(&self, chat: &ChatInfo<'_>) -> bool {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.values().any(|log| log.chat.matches(chat))
    }

    /// Append a message to every source watching `chat`. Returns the number
    /// of sources it was recorded for.
    pub fn record(&self, chat: &ChatInfo<'_>, message: HistoryMessage) -> usize {
        let now = Utc::now();
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        let mut recorded = 0;
        for (source_id, log) in sources.iter_mut() {
            if !log.chat.matches(chat) {
                continue;
            }
            if let Some(title) = chat.title {
                log.title = Some(title.to_string());
            }
            log.messages.push_back(message.clone());
            log.prune(now);
            recorded += 1;
            trace!(
                source_id,
                message_id = message.id,
                buffered = log.messages.len(),
                "recorded message"
            );
        }
        recorded
    }

    /// Messages of `source_id` no older than `lookback`.
    pub fn window(&self, source_id: &str, lookback: Duration) -> Result<MessageHistory> {
        let now = Utc::now();
        let cutoff = cutoff(now, lookback);
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        let log = sources
            .get(source_id)
            .ok_or_else(|| Error::unknown_source(source_id))?;
        let messages: Vec<HistoryMessage> = log
            .messages
            .iter()
            .filter(|m| m.timestamp >= cutoff && m.timestamp <= now)
            .cloned()
            .collect();
        debug!(
            source_id,
            messages = messages.len(),
            buffered = log.messages.len(),
            "history window"
        );
        Ok(MessageHistory {
            title: log.title.clone().unwrap_or_else(|| log.chat_ref.clone()),
            messages,
        })
    }
}

#[async_trait]
impl HistoryClient for HistoryBuffer {
    async fn get_message_history(
        &self,
        source_id: &str,
        lookback: Duration,
    ) -> Result<MessageHistory> {
        self.window(source_id, lookback)
    }
}

fn cutoff(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(lookback)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
