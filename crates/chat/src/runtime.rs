//! State shared by the inbound router and the summary jobs.

use std::{collections::HashSet, sync::Arc, time::Duration};

use {
    envoy_agents::Summarizer,
    envoy_channels::{ChannelOutbound, HistoryClient},
    envoy_config::{PromptTemplate, SourceConfig},
    envoy_sessions::{ActivityIndicator, SessionGate, SessionSelection, VerificationRecord},
    tracing::warn,
};

/// A source ready to summarize: template loaded and validated.
#[derive(Debug, Clone)]
pub struct SummarySource {
    pub id: String,
    pub lookback: Duration,
    pub template: PromptTemplate,
}

impl SummarySource {
    /// Load the source's prompt template from disk.
    pub fn from_config(config: &SourceConfig) -> envoy_config::Result<Self> {
        Ok(Self {
            id: config.id.clone(),
            lookback: config.lookback(),
            template: PromptTemplate::load(&config.summarization_prompt_path)?,
        })
    }
}

/// The process-wide core: configuration, session state and collaborators.
pub struct ChatRuntime {
    pub(crate) sources: Vec<SummarySource>,
    pub(crate) receivers: Vec<String>,
    pub(crate) gate: SessionGate,
    pub(crate) selection: SessionSelection,
    pub(crate) verification: Arc<VerificationRecord>,
    pub(crate) activity: ActivityIndicator,
    pub(crate) outbound: Arc<dyn ChannelOutbound>,
    pub(crate) history: Arc<dyn HistoryClient>,
    pub(crate) summarizer: Summarizer,
}

impl ChatRuntime {
    /// Receivers are matched case-insensitively, so repeated aliases are
    /// dropped and the first spelling is kept.
    pub fn new(
        sources: Vec<SummarySource>,
        receivers: Vec<String>,
        outbound: Arc<dyn ChannelOutbound>,
        history: Arc<dyn HistoryClient>,
        summarizer: Summarizer,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(receivers.len());
        for alias in receivers {
            if seen.insert(alias.to_lowercase()) {
                unique.push(alias);
            } else {
                warn!(alias = %alias, "ignoring duplicate receiver");
            }
        }
        let receivers = unique;
        let verification = Arc::new(VerificationRecord::new());
        let activity = ActivityIndicator::new(Arc::clone(&outbound), Arc::clone(&verification));
        Self {
            sources,
            receivers,
            gate: SessionGate::default(),
            selection: SessionSelection::new(),
            verification,
            activity,
            outbound,
            history,
            summarizer,
        }
    }

    /// Override the typing-indicator interval.
    #[must_use]
    pub fn with_activity_interval(mut self, interval: Duration) -> Self {
        self.activity = self.activity.with_interval(interval);
        self
    }

    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SummarySource> {
        self.sources.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn sources(&self) -> &[SummarySource] {
        &self.sources
    }

    #[must_use]
    pub fn receivers(&self) -> &[String] {
        &self.receivers
    }

    /// Context-switch commands, one per source (`/news, /sports`).
    #[must_use]
    pub fn valid_commands(&self) -> String {
        self.sources
            .iter()
            .map(|s| format!("/{}", s.id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn selection(&self) -> &SessionSelection {
        &self.selection
    }

    #[must_use]
    pub fn verification(&self) -> &VerificationRecord {
        &self.verification
    }

    #[must_use]
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }
}
