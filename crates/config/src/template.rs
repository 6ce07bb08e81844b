//! Starter files written by `envoy init`.

/// Default config template with every option documented.
#[must_use]
pub fn default_config_template() -> String {
    format!(
        r##"# Envoy Configuration
# ===================
# Changes require a restart to take effect.
#
# Environment variable substitution is supported: ${{ENV_VAR}}
# Example: api_key = "${{OPENAI_API_KEY}}"

log_level = "info"                     # trace | debug | info | warn | error

# Telegram usernames allowed to talk to the bot. Each receiver must send
# /verify once before summaries are delivered to them.
summary_receivers = [
    # "alice",
]

# ══════════════════════════════════════════════════════════════════════════════
# TELEGRAM
# ══════════════════════════════════════════════════════════════════════════════

[telegram]
token = "${{TELEGRAM_BOT_TOKEN}}"        # Bot token from @BotFather
poll_timeout_secs = 30                 # Long-poll timeout for getUpdates

# ══════════════════════════════════════════════════════════════════════════════
# LANGUAGE MODEL
# ══════════════════════════════════════════════════════════════════════════════

[llm]
api_key = "${{OPENAI_API_KEY}}"
model = "{model}"
# base_url = "{base_url}"   # Any OpenAI-compatible endpoint
# system_prompt = "{system_prompt}"

# ══════════════════════════════════════════════════════════════════════════════
# SOURCES
# ══════════════════════════════════════════════════════════════════════════════
# One block per chat to summarize. The bot must be a member of the chat.
# Summaries run at startup and then every lookback period.

# [[sources]]
# id = "news"                          # Used as the /news command
# chat = "@my_news_channel"            # Chat username or numeric id (defaults to id)
# lookback_period_seconds = 86400      # Window length and run interval
# summarization_prompt_path = "prompts/news.txt"   # Relative to this file
"##,
        model = crate::schema::DEFAULT_MODEL,
        base_url = crate::schema::DEFAULT_BASE_URL,
        system_prompt = crate::schema::DEFAULT_SYSTEM_PROMPT,
    )
}

/// Example summarization prompt.
pub const EXAMPLE_PROMPT: &str = "\
Below is a JSON document with the messages posted in a chat during the last period.
Write a short digest of the main topics, decisions and open questions.
Mention who said what when it matters. Answer in the language of the messages.

{text_to_summarize}
";
