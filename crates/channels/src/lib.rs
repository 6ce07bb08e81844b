//! Channel abstractions.
//!
//! A channel (Telegram today) delivers private messages to an
//! [`InboundHandler`], sends text and typing indicators through
//! [`ChannelOutbound`], and records watched chats into a [`HistoryBuffer`].

pub mod error;
pub mod gating;
pub mod history;
pub mod plugin;

pub use {
    error::{Error, Result},
    history::{
        ChatInfo, HistoryBuffer, HistoryClient, HistoryMessage, MessageHistory, WatchedSource,
    },
    plugin::{ChannelOutbound, ChannelPlugin, FormatHint, InboundHandler, InboundMessage},
};
