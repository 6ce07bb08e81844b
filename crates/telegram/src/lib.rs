//! Telegram channel for envoy.
//!
//! Implements `ChannelPlugin` on top of teloxide: a manual long-poll loop
//! feeds private messages to the command router and records watched chats
//! into the history buffer; outbound sends handle chunking, HTML fallback
//! and rate limits.

pub mod bot;
pub mod chunk;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod plugin;

#[cfg(test)]
mod testing;

pub use {
    config::TelegramConfig,
    error::{Error, Result},
    outbound::TelegramOutbound,
    plugin::TelegramPlugin,
};
