//! One summarization cycle for one source.

use std::{sync::Arc, time::Duration};

use {
    envoy_channels::FormatHint,
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    runtime::ChatRuntime,
};

/// What a finished cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub source_id: String,
    pub messages: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct SummaryJob {
    runtime: Arc<ChatRuntime>,
}

impl SummaryJob {
    pub fn new(runtime: Arc<ChatRuntime>) -> Self {
        Self { runtime }
    }

    /// Summarize the source's recent window and hand the result to every
    /// configured receiver.
    ///
    /// The session gate is held from before the history fetch until the
    /// last delivery. Upstream failures abandon the cycle.
    pub async fn run(&self, source_id: &str) -> Result<JobReport> {
        let rt = &self.runtime;
        let source = rt.source(source_id).ok_or_else(|| Error::UnknownSource {
            source_id: source_id.to_string(),
        })?;

        let mut guard = rt.gate.acquire(format!("summary:{source_id}")).await;
        let activity = rt.activity.spawn(rt.receivers.clone());

        let result = async {
            let history = rt
                .history
                .get_message_history(&source.id, source.lookback)
                .await
                .map_err(|e| Error::upstream("history fetch", e))?;
            if history.messages.is_empty() {
                info!(source_id, title = %history.title, "no messages in window");
            }
            let json = history
                .to_json()
                .map_err(|e| Error::upstream("history serialization", e))?;

            let (summary, conversation) = rt
                .summarizer
                .summarize(&json, &source.template)
                .await
                .map_err(|e| Error::upstream("summarization", e))?;
            let text = summary_message(&source.id, source.lookback, &summary);

            let mut report = JobReport {
                source_id: source.id.clone(),
                messages: history.messages.len(),
                ..Default::default()
            };
            for alias in &rt.receivers {
                guard.put(&source.id, alias, conversation.clone());
                rt.selection.select(alias, &source.id);

                let Some(address) = rt.verification.address(alias) else {
                    let skipped = Error::UnverifiedRecipient {
                        alias: alias.clone(),
                    };
                    info!(source_id, reason = %skipped, "delivery skipped");
                    report.skipped += 1;
                    continue;
                };
                match rt.outbound.send_text(&address, &text, FormatHint::Html).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!(source_id, alias = %alias, error = %e, "summary delivery failed");
                        report.failed += 1;
                    },
                }
            }
            Ok::<_, Error>(report)
        }
        .await;

        activity.stop().await;
        drop(guard);

        match &result {
            Ok(report) => info!(
                source_id,
                messages = report.messages,
                delivered = report.delivered,
                skipped = report.skipped,
                failed = report.failed,
                "summary job finished"
            ),
            Err(e) => warn!(source_id, error = %e, "summary job abandoned"),
        }
        result
    }
}

/// The delivered text: an HTML header naming the source and window,
/// followed by the summary.
#[must_use]
pub fn summary_message(source_id: &str, lookback: Duration, summary: &str) -> String {
    format!(
        "Summary for <b>{}</b> for the last {}:\n\n{}",
        escape_html(source_id),
        describe_window(lookback),
        escape_html(summary)
    )
}

fn describe_window(lookback: Duration) -> String {
    let secs = lookback.as_secs();
    let (n, unit) = if secs >= 3600 {
        (secs / 3600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
