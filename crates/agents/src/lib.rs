//! Language-model access: provider trait, the OpenAI-compatible backend and
//! the summarizer built on top of it.

pub mod error;
pub mod model;
pub mod providers;
pub mod summarizer;

pub use {
    error::{Error, Result},
    model::{ChatMessage, CompletionResponse, LlmProvider, Usage},
    summarizer::{Conversation, Summarizer},
};
