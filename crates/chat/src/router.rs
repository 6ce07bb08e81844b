//! Inbound command router.
//!
//! Every private message is one of: `/verify`, a context switch
//! (`/<source id>`), or freeform chat forwarded to the selected source's
//! conversation.

use std::sync::Arc;

use {
    async_trait::async_trait,
    envoy_channels::{FormatHint, InboundHandler, InboundMessage, gating::resolve_alias},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    runtime::ChatRuntime,
};

pub const VERIFY_COMMAND: &str = "/verify";

pub const VERIFIED_REPLY: &str = "You are now verified and will receive generated summaries";

/// Successful handling of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Verified,
    Switched { source_id: String },
    Answered { reply: String },
}

impl RouteOutcome {
    #[must_use]
    pub fn reply_text(&self) -> String {
        match self {
            Self::Verified => VERIFIED_REPLY.to_string(),
            Self::Switched { source_id } => format!("Switched context to {source_id}"),
            Self::Answered { reply } => reply.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Router {
    runtime: Arc<ChatRuntime>,
}

impl Router {
    pub fn new(runtime: Arc<ChatRuntime>) -> Self {
        Self { runtime }
    }

    /// Interpret one inbound message and apply its state changes. Errors
    /// carry the user-facing rejection, if there is one.
    pub async fn route(&self, message: &InboundMessage) -> Result<RouteOutcome> {
        let text = message
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::NoText)?;
        let sender = message.sender_alias.as_deref().unwrap_or_default();
        let alias = resolve_alias(sender, &self.runtime.receivers).ok_or_else(|| {
            Error::Unauthorized {
                sender: sender.to_string(),
            }
        })?;

        if text == VERIFY_COMMAND {
            self.runtime
                .verification
                .verify(alias, &message.reply_address);
            return Ok(RouteOutcome::Verified);
        }

        if let Some(command) = text.strip_prefix('/') {
            let Some(source) = self.runtime.source(command) else {
                return Err(Error::InvalidCommand {
                    command: text.to_string(),
                    valid: self.runtime.valid_commands(),
                });
            };
            let _guard = self.runtime.gate.acquire(format!("switch:{alias}")).await;
            self.runtime.selection.select(alias, &source.id);
            return Ok(RouteOutcome::Switched {
                source_id: source.id.clone(),
            });
        }

        let reply = self.chat_turn(alias, text).await?;
        Ok(RouteOutcome::Answered { reply })
    }

    /// One exchange with the selected conversation, entirely under the
    /// session gate. The selection is read under the gate too, so a job
    /// finishing first decides which context the turn continues.
    async fn chat_turn(&self, alias: &str, input: &str) -> Result<String> {
        let rt = &self.runtime;
        let mut guard = rt.gate.acquire(format!("chat:{alias}")).await;
        let Some(source_id) = rt.selection.current(alias) else {
            return Err(Error::NoSelection {
                valid: rt.valid_commands(),
            });
        };
        let source_id = source_id.as_str();
        let activity = rt.activity.spawn(vec![alias.to_string()]);

        let result = async {
            let conversation = guard.get(source_id, alias)?;
            info!(alias, source_id, turns = conversation.turns(), "chatting");
            let (reply, updated) = rt
                .summarizer
                .predict(conversation, input)
                .await
                .map_err(|e| Error::upstream("chat turn", e))?;
            guard.put(source_id, alias, updated);
            Ok::<_, Error>(reply)
        }
        .await;

        activity.stop().await;
        drop(guard);
        result
    }

    async fn reply(&self, to: &str, text: &str) {
        if let Err(e) = self
            .runtime
            .outbound
            .send_text(to, text, FormatHint::Plain)
            .await
        {
            warn!(to, error = %e, "failed to send reply");
        }
    }
}

#[async_trait]
impl InboundHandler for Router {
    async fn handle(&self, message: InboundMessage) {
        let reply = match self.route(&message).await {
            Ok(outcome) => {
                debug!(?outcome, "message routed");
                Some(outcome.reply_text())
            },
            Err(e) => {
                match &e {
                    Error::Unauthorized { sender } => {
                        warn!(sender = %sender, "unauthorized usage attempt")
                    },
                    Error::NoText => debug!("ignoring message without text"),
                    Error::Upstream { .. } => warn!(error = %e, "chat turn failed"),
                    _ => info!(reason = %e, "message rejected"),
                }
                e.user_reply()
            },
        };
        if let Some(text) = reply {
            self.reply(&message.reply_address, &text).await;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{summary_job::SummaryJob, testing::*},
        rstest::rstest,
        std::{sync::atomic::Ordering, time::Duration},
    };

    #[tokio::test]
    async fn verify_records_address_and_confirms() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());

        router.handle(inbound("alice", "/verify")).await;

        assert_eq!(
            h.runtime.verification().address("alice").as_deref(),
            Some("chat-alice")
        );
        let sent = h.outbound.sent_to("chat-alice");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, VERIFIED_REPLY);
    }

    #[tokio::test]
    async fn reverify_overwrites_address() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());

        router.route(&inbound("alice", "/verify")).await.unwrap();
        let mut moved = inbound("alice", "/verify");
        moved.reply_address = "chat-new".into();
        router.route(&moved).await.unwrap();

        assert_eq!(h.runtime.verification().len(), 1);
        assert_eq!(
            h.runtime.verification().address("alice").as_deref(),
            Some("chat-new")
        );
    }

    #[rstest]
    #[case::not_listed(Some("mallory"), Some("/verify"))]
    #[case::no_username(None, Some("/verify"))]
    #[case::no_text(Some("alice"), None)]
    #[case::empty_text(Some("alice"), Some(""))]
    #[tokio::test]
    async fn dropped_silently(#[case] sender: Option<&str>, #[case] text: Option<&str>) {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        let message = InboundMessage {
            sender_alias: sender.map(str::to_string),
            text: text.map(str::to_string),
            reply_address: "chat-x".into(),
        };

        let err = router.route(&message).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. } | Error::NoText));

        router.handle(message).await;
        assert!(h.outbound.sent.lock().unwrap().is_empty());
        assert!(h.runtime.verification().is_empty());
    }

    #[tokio::test]
    async fn alias_matching_is_case_insensitive() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("Alice", "/news")).await.unwrap();
        assert_eq!(
            h.runtime.selection().current("alice").as_deref(),
            Some("news")
        );
    }

    #[tokio::test]
    async fn switch_command_selects_source() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());

        router.handle(inbound("bob", "/sports")).await;

        assert_eq!(
            h.runtime.selection().current("bob").as_deref(),
            Some("sports")
        );
        assert_eq!(
            h.outbound.sent_to("chat-bob")[0].text,
            "Switched context to sports"
        );
    }

    #[rstest]
    #[case("/foo")]
    #[case("/new")]
    #[case("/news ")]
    #[case("/NEWS")]
    #[tokio::test]
    async fn unknown_command_lists_valid_ones(#[case] command: &str) {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("alice", "/sports")).await.unwrap();

        router.handle(inbound("alice", command)).await;

        let sent = h.outbound.sent_to("chat-alice");
        assert_eq!(
            sent.last().unwrap().text,
            "Invalid command, valid commands are: /news, /sports"
        );
        assert_eq!(
            h.runtime.selection().current("alice").as_deref(),
            Some("sports")
        );
    }

    #[tokio::test]
    async fn freeform_without_selection_prompts_once() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());

        router.handle(inbound("alice", "what happened?")).await;

        let sent = h.outbound.sent_to("chat-alice");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].text,
            "Select context first, valid commands are: /news, /sports"
        );
        assert!(h.provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selected_but_no_context_yet() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("alice", "/news")).await.unwrap();

        router.handle(inbound("alice", "anything new?")).await;

        assert_eq!(
            h.outbound.sent_to("chat-alice").last().unwrap().text,
            "No context is available for news yet"
        );
        assert!(!h.runtime.gate().is_held());
    }

    #[tokio::test]
    async fn chat_turn_extends_conversation() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("alice", "/verify")).await.unwrap();
        SummaryJob::new(h.runtime.clone()).run("news").await.unwrap();

        let outcome = router.route(&inbound("alice", "tell me more")).await.unwrap();
        assert_eq!(outcome, RouteOutcome::Answered {
            reply: "re: tell me more".into()
        });

        let store = h.runtime.gate().acquire("test").await;
        assert_eq!(store.get("news", "alice").unwrap().turns(), 2);
        // Other recipients keep their own copy.
        assert_eq!(store.get("news", "bob").unwrap().turns(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_gives_generic_reply_and_releases_gate() {
        let h = harness(ScriptedProvider::default());
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("alice", "/verify")).await.unwrap();
        SummaryJob::new(h.runtime.clone()).run("news").await.unwrap();
        h.provider.fail.store(true, Ordering::SeqCst);

        router.handle(inbound("alice", "tell me more")).await;

        assert_eq!(
            h.outbound.sent_to("chat-alice").last().unwrap().text,
            crate::error::GENERIC_FAILURE_REPLY
        );
        assert!(!h.runtime.gate().is_held());
        let store = h.runtime.gate().acquire("test").await;
        assert_eq!(store.get("news", "alice").unwrap().turns(), 1);
    }

    #[tokio::test]
    async fn chat_turn_signals_typing_to_sender_only() {
        let h = harness(ScriptedProvider::with_delay(Duration::from_millis(40)));
        let router = Router::new(h.runtime.clone());
        router.route(&inbound("alice", "/verify")).await.unwrap();
        router.route(&inbound("bob", "/verify")).await.unwrap();
        SummaryJob::new(h.runtime.clone()).run("news").await.unwrap();
        h.outbound.typing.lock().unwrap().clear();

        router.route(&inbound("alice", "more")).await.unwrap();

        let typing = h.outbound.typing.lock().unwrap().clone();
        assert!(!typing.is_empty());
        assert!(typing.iter().all(|to| to == "chat-alice"));
    }
}
