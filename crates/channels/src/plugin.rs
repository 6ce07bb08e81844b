use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait};

use crate::history::HistoryBuffer;

/// How the transport should render outbound text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatHint {
    #[default]
    Plain,
    Html,
}

/// A private message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender username without the leading `@`, if the account has one.
    pub sender_alias: Option<String>,
    pub text: Option<String>,
    /// Transport-specific address replies go to (a chat id for Telegram).
    pub reply_address: String,
}

/// Receives inbound messages from a channel.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage);
}

/// Send messages to a channel.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str, format: FormatHint) -> Result<()>;

    /// Send a "typing" indicator. No-op by default.
    async fn send_typing(&self, _to: &str) -> Result<()> {
        Ok(())
    }
}

/// Core channel plugin trait. Each messaging platform implements this.
#[async_trait]
pub trait ChannelPlugin: Send + Sync {
    /// Channel identifier (e.g. "telegram").
    fn id(&self) -> &str;

    /// Outbound adapter; available as soon as the plugin is constructed.
    fn outbound(&self) -> Arc<dyn ChannelOutbound>;

    /// Start receiving. Private messages go to `handler`; messages from
    /// watched chats are recorded into `history`.
    async fn start(
        &mut self,
        handler: Arc<dyn InboundHandler>,
        history: Arc<HistoryBuffer>,
    ) -> Result<()>;

    /// Stop receiving and wait for the receive loop to exit.
    async fn stop(&mut self) -> Result<()>;
}
