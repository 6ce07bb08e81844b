use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    config::TelegramConfig,
    error::{Error, Result},
    handlers::{self, HandlerContext},
};

/// Pause after a failed `getUpdates` call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build a bot whose HTTP timeout outlasts the long-poll timeout, so the
/// client does not abort the request before Telegram responds.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
        .build()?;
    let mut bot = Bot::with_client(config.token.expose_secret(), client);
    if let Some(api_url) = &config.api_url {
        let url = reqwest::Url::parse(api_url)
            .map_err(|e| Error::external(format!("invalid telegram api_url {api_url:?}"), e))?;
        bot = bot.set_api_url(url);
    }
    Ok(bot)
}

/// `/verify` plus one switch command per source.
///
/// Ids that are not valid Telegram command names (lowercase letters,
/// digits, underscores, at most 32 chars) still work when typed, they are
/// just not offered for autocomplete.
pub fn bot_commands<'a>(source_ids: impl IntoIterator<Item = &'a str>) -> Vec<BotCommand> {
    let mut commands = vec![BotCommand::new(
        "verify",
        "Receive generated summaries in this chat",
    )];
    for id in source_ids {
        if is_command_name(id) {
            commands.push(BotCommand::new(id, format!("Chat about the {id} summary")));
        } else {
            debug!(source_id = id, "source id is not a valid bot command name");
        }
    }
    commands
}

fn is_command_name(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Verify the token, clear any webhook and register commands.
/// Returns the bot username.
pub async fn connect(bot: &Bot, commands: Vec<BotCommand>) -> Result<Option<String>> {
    let me = bot.get_me().send().await?;
    bot.delete_webhook().send().await?;
    if let Err(e) = bot.set_my_commands(commands).send().await {
        warn!(error = %e, "failed to register bot commands");
    }
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");
    Ok(me.username.clone())
}

/// Spawn the manual `getUpdates` loop. It runs until `cancel` fires or
/// Telegram reports that another instance is polling with the same token.
pub fn spawn_polling(
    bot: Bot,
    poll_timeout_secs: u32,
    ctx: HandlerContext,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::ChannelPost])
                .send();
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = request => result,
            };

            match result {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "got telegram updates");
                    }
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => {
                                handlers::handle_message(&msg, &ctx).await;
                            },
                            other => debug!("ignoring telegram update: {other:?}"),
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!(
                        "telegram polling stopped: another instance is already running with this token"
                    );
                    cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    })
}
