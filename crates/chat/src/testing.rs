//! Doubles shared by the router and summary job tests.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::Utc,
    envoy_agents::{ChatMessage, CompletionResponse, LlmProvider, Summarizer},
    envoy_channels::{
        ChannelOutbound, FormatHint, HistoryClient, HistoryMessage, InboundMessage, MessageHistory,
    },
    envoy_config::PromptTemplate,
};

use crate::runtime::{ChatRuntime, SummarySource};

pub const SUMMARY: &str = "Today: X happened.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub to: String,
    pub text: String,
    pub format: FormatHint,
}

#[derive(Default)]
pub struct RecordingOutbound {
    pub sent: Mutex<Vec<Sent>>,
    pub typing: Mutex<Vec<String>>,
}

impl RecordingOutbound {
    pub fn sent_to(&self, to: &str) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|s| s.to == to)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_text(&self, to: &str, text: &str, format: FormatHint) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Sent {
                to: to.into(),
                text: text.into(),
                format,
            });
        Ok(())
    }

    async fn send_typing(&self, to: &str) -> anyhow::Result<()> {
        self.typing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(to.into());
        Ok(())
    }
}

#[derive(Default)]
pub struct StaticHistory {
    pub fail: AtomicBool,
}

#[async_trait]
impl HistoryClient for StaticHistory {
    async fn get_message_history(
        &self,
        source_id: &str,
        _lookback: Duration,
    ) -> envoy_channels::Result<MessageHistory> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(envoy_channels::Error::unavailable("history backend down"));
        }
        Ok(MessageHistory {
            title: source_id.to_string(),
            messages: vec![HistoryMessage {
                id: 1,
                timestamp: Utc::now(),
                text: "X happened".into(),
                sender_name: "Carol".into(),
                sender_id: Some(3),
                is_reply: false,
                reply_to_id: None,
            }],
        })
    }
}

/// Answers summaries with [`SUMMARY`] and chat input with `re: <input>`.
/// Logs `start:`/`end:` events around an artificial delay.
#[derive(Default)]
pub struct ScriptedProvider {
    pub delay: Duration,
    pub fail: AtomicBool,
    pub events: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn log(&self, event: String) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn id(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        let input = messages.last().map(ChatMessage::content).unwrap_or_default();
        let label = if input.starts_with("Summarize:") {
            "summary".to_string()
        } else {
            input.to_string()
        };

        self.log(format!("start:{label}"));
        tokio::time::sleep(self.delay).await;
        self.log(format!("end:{label}"));

        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("model unavailable");
        }
        let text = if label == "summary" {
            SUMMARY.to_string()
        } else {
            format!("re: {input}")
        };
        Ok(CompletionResponse {
            text: Some(text),
            ..Default::default()
        })
    }
}

pub struct Harness {
    pub runtime: Arc<ChatRuntime>,
    pub outbound: Arc<RecordingOutbound>,
    pub history: Arc<StaticHistory>,
    pub provider: Arc<ScriptedProvider>,
}

pub fn source(id: &str, lookback_secs: u64) -> SummarySource {
    SummarySource {
        id: id.into(),
        lookback: Duration::from_secs(lookback_secs),
        template: PromptTemplate::parse("Summarize:\n{text_to_summarize}", id)
            .unwrap_or_else(|e| panic!("{e}")),
    }
}

/// Sources `news` (1 h) and `sports` (1 d); receivers `alice` and `bob`.
pub fn harness(provider: ScriptedProvider) -> Harness {
    harness_with_receivers(provider, &["alice", "bob"])
}

pub fn harness_with_receivers(provider: ScriptedProvider, receivers: &[&str]) -> Harness {
    let outbound = Arc::new(RecordingOutbound::default());
    let history = Arc::new(StaticHistory::default());
    let provider = Arc::new(provider);
    let runtime = ChatRuntime::new(
        vec![source("news", 3600), source("sports", 86_400)],
        receivers.iter().map(|r| r.to_string()).collect(),
        outbound.clone(),
        history.clone(),
        Summarizer::new(provider.clone(), "sys"),
    )
    .with_activity_interval(Duration::from_millis(10));
    Harness {
        runtime: Arc::new(runtime),
        outbound,
        history,
        provider,
    }
}

pub fn inbound(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        sender_alias: Some(sender.into()),
        text: Some(text.into()),
        reply_address: format!("chat-{sender}"),
    }
}
