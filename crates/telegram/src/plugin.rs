use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    teloxide::{Bot, types::BotCommand},
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use envoy_channels::{ChannelOutbound, ChannelPlugin, HistoryBuffer, InboundHandler};

use crate::{
    bot,
    config::TelegramConfig,
    handlers::HandlerContext,
    outbound::TelegramOutbound,
};

struct Polling {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Telegram channel plugin.
pub struct TelegramPlugin {
    config: TelegramConfig,
    bot: Bot,
    outbound: Arc<TelegramOutbound>,
    commands: Vec<BotCommand>,
    polling: Option<Polling>,
}

impl TelegramPlugin {
    pub fn new(config: TelegramConfig) -> crate::Result<Self> {
        let bot = bot::build_bot(&config)?;
        Ok(Self {
            outbound: Arc::new(TelegramOutbound::new(bot.clone())),
            bot,
            commands: bot::bot_commands(std::iter::empty()),
            config,
            polling: None,
        })
    }

    /// Build from the raw `[telegram]` config table.
    pub fn from_value(value: &serde_json::Value) -> crate::Result<Self> {
        Self::new(TelegramConfig::from_value(value)?)
    }

    /// Offer `/<id>` autocomplete for each source.
    #[must_use]
    pub fn with_source_commands<'a>(mut self, source_ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.commands = bot::bot_commands(source_ids);
        self
    }
}

#[async_trait]
impl ChannelPlugin for TelegramPlugin {
    fn id(&self) -> &str {
        "telegram"
    }

    fn outbound(&self) -> Arc<dyn ChannelOutbound> {
        self.outbound.clone()
    }

    async fn start(
        &mut self,
        handler: Arc<dyn InboundHandler>,
        history: Arc<HistoryBuffer>,
    ) -> Result<()> {
        if self.polling.is_some() {
            anyhow::bail!("telegram channel already started");
        }
        bot::connect(&self.bot, self.commands.clone()).await?;

        let cancel = CancellationToken::new();
        let handle = bot::spawn_polling(
            self.bot.clone(),
            self.config.poll_timeout_secs,
            HandlerContext { handler, history },
            cancel.clone(),
        );
        self.polling = Some(Polling { cancel, handle });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(polling) = self.polling.take() else {
            warn!("telegram channel not running");
            return Ok(());
        };
        info!("stopping telegram channel");
        polling.cancel.cancel();
        polling.handle.await?;
        Ok(())
    }
}
