use std::sync::Arc;

use {
    teloxide::types::{Chat, Message},
    tracing::{debug, trace},
};

use envoy_channels::{ChatInfo, HistoryBuffer, HistoryMessage, InboundHandler, InboundMessage};

/// Sender name used when neither the user nor the chat carries one.
pub const UNKNOWN_SENDER: &str = "<unknown>";

/// Where updates go once they are pulled off the Bot API.
#[derive(Clone)]
pub struct HandlerContext {
    pub handler: Arc<dyn InboundHandler>,
    pub history: Arc<HistoryBuffer>,
}

/// Handle one message or channel post.
///
/// Messages from watched chats are recorded into the history buffer;
/// private chats are routed to the inbound handler. A chat can be both.
pub async fn handle_message(msg: &Message, ctx: &HandlerContext) {
    let chat = chat_info(&msg.chat);
    if ctx.history.watches(&chat) {
        match history_entry(msg) {
            Some(entry) => {
                let len = ctx.history.record(&chat, entry);
                trace!(chat_id = chat.id, message_id = msg.id.0, len, "message recorded");
            },
            None => debug!(
                chat_id = chat.id,
                message_id = msg.id.0,
                "skipping watched message without text"
            ),
        }
    }

    if msg.chat.is_private() {
        ctx.handler.handle(inbound_message(msg)).await;
    }
}

pub fn chat_info(chat: &Chat) -> ChatInfo<'_> {
    ChatInfo {
        id: chat.id.0,
        username: chat.username(),
        title: chat.title(),
    }
}

/// The router-facing view of a private message.
pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        sender_alias: msg.from.as_ref().and_then(|u| u.username.clone()),
        text: msg.text().map(str::to_string),
        reply_address: msg.chat.id.0.to_string(),
    }
}

/// Convert a message into a history entry. `None` for messages without
/// text (media, service messages).
pub fn history_entry(msg: &Message) -> Option<HistoryMessage> {
    let text = msg.text()?;
    let reply_to_id = msg.reply_to_message().map(|r| i64::from(r.id.0));
    Some(HistoryMessage {
        id: i64::from(msg.id.0),
        timestamp: msg.date,
        text: text.to_string(),
        sender_name: sender_name(msg),
        sender_id: sender_id(msg),
        is_reply: reply_to_id.is_some(),
        reply_to_id,
    })
}

/// "first last", first, or last name of the sender; channel posts use the
/// posting chat's title.
pub fn sender_name(msg: &Message) -> String {
    if let Some(user) = &msg.from {
        let first = user.first_name.trim();
        let last = user.last_name.as_deref().unwrap_or_default().trim();
        let name = match (first.is_empty(), last.is_empty()) {
            (false, false) => format!("{first} {last}"),
            (false, true) => first.to_string(),
            (true, false) => last.to_string(),
            (true, true) => UNKNOWN_SENDER.to_string(),
        };
        return name;
    }
    msg.sender_chat
        .as_ref()
        .unwrap_or(&msg.chat)
        .title()
        .map_or_else(|| UNKNOWN_SENDER.to_string(), str::to_string)
}

fn sender_id(msg: &Message) -> Option<i64> {
    match (&msg.from, &msg.sender_chat) {
        (Some(user), _) => i64::try_from(user.id.0).ok(),
        (None, Some(chat)) => Some(chat.id.0),
        (None, None) => None,
    }
}
