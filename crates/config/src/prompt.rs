//! Summarization prompt templates.

use std::path::Path;

use crate::error::{Context, Error, Result};

/// Literal token replaced with the serialized chat history.
pub const TEXT_PLACEHOLDER: &str = "{text_to_summarize}";

/// A validated summarization prompt.
///
/// Construction guarantees the template contains [`TEXT_PLACEHOLDER`], so
/// rendering never silently drops the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    raw: String,
}

impl PromptTemplate {
    /// Validate an in-memory template. `origin` names the template in errors.
    pub fn parse(raw: impl Into<String>, origin: &str) -> Result<Self> {
        let raw = raw.into();
        if !raw.contains(TEXT_PLACEHOLDER) {
            return Err(Error::MissingPlaceholder {
                path: origin.to_string(),
                placeholder: TEXT_PLACEHOLDER,
            });
        }
        Ok(Self { raw })
    }

    /// Read and validate a template file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt template {}", path.display()))?;
        Self::parse(raw, &path.display().to_string())
    }

    /// Substitute the serialized history into the template.
    #[must_use]
    pub fn render(&self, text_to_summarize: &str) -> String {
        self.raw.replace(TEXT_PLACEHOLDER, text_to_summarize)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
