use thiserror::Error;

/// Reply sent when an upstream call fails during a chat turn.
pub const GENERIC_FAILURE_REPLY: &str =
    "Something went wrong while preparing the answer, please try again later";

#[derive(Debug, Error)]
pub enum Error {
    /// Sender missing from the receivers allow-list. Never answered.
    #[error("unauthorized sender: {sender}")]
    Unauthorized { sender: String },

    /// Inbound message without text. Never answered.
    #[error("message has no text")]
    NoText,

    #[error("Invalid command, valid commands are: {valid}")]
    InvalidCommand { command: String, valid: String },

    #[error("Select context first, valid commands are: {valid}")]
    NoSelection { valid: String },

    #[error("No context is available for {source_id} yet")]
    NoContextAvailable { source_id: String },

    /// Summary delivery skipped: the recipient never sent `/verify`.
    #[error("recipient {alias} is not verified")]
    UnverifiedRecipient { alias: String },

    #[error("unknown source: {source_id}")]
    UnknownSource { source_id: String },

    /// History or model backend failed.
    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn upstream(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Upstream {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Text to send back to the sender, if any.
    #[must_use]
    pub fn user_reply(&self) -> Option<String> {
        match self {
            Self::Unauthorized { .. } | Self::NoText | Self::UnverifiedRecipient { .. } => None,
            Self::Upstream { .. } | Self::UnknownSource { .. } => {
                Some(GENERIC_FAILURE_REPLY.to_string())
            },
            Self::InvalidCommand { .. }
            | Self::NoSelection { .. }
            | Self::NoContextAvailable { .. } => Some(self.to_string()),
        }
    }
}

impl From<envoy_sessions::Error> for Error {
    fn from(err: envoy_sessions::Error) -> Self {
        match err {
            envoy_sessions::Error::NoContextAvailable { source_id, .. } => {
                Self::NoContextAvailable { source_id }
            },
            other => Self::upstream("session store", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_texts() {
        let err = Error::InvalidCommand {
            command: "/foo".into(),
            valid: "/news, /sports".into(),
        };
        assert_eq!(
            err.user_reply().as_deref(),
            Some("Invalid command, valid commands are: /news, /sports")
        );
        assert_eq!(
            Error::NoContextAvailable {
                source_id: "news".into()
            }
            .user_reply()
            .as_deref(),
            Some("No context is available for news yet")
        );
    }

    #[test]
    fn silent_errors_have_no_reply() {
        assert_eq!(
            Error::Unauthorized {
                sender: "mallory".into()
            }
            .user_reply(),
            None
        );
        assert_eq!(Error::NoText.user_reply(), None);
    }

    #[test]
    fn upstream_reply_hides_details() {
        let err = Error::upstream("llm", std::io::Error::other("401 invalid api key"));
        let reply = err.user_reply().unwrap_or_default();
        assert_eq!(reply, GENERIC_FAILURE_REPLY);
        assert!(!reply.contains("api key"));
    }

    #[test]
    fn session_no_context_maps_to_user_error() {
        let err: Error = envoy_sessions::Error::no_context("news", "alice").into();
        assert!(matches!(err, Error::NoContextAvailable { ref source_id } if source_id == "news"));
    }
}
