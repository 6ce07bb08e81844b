//! Configuration validation engine.
//!
//! Validates config files against the known schema, detects unknown or
//! misspelled fields, and checks the semantic rules the runtime relies on:
//! credentials present, source ids usable as commands, prompt templates
//! readable and carrying the history placeholder.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use crate::{
    env_subst::{substitute_env, unresolved_vars},
    error::{Error, Result},
    loader::{find_config_file, parse_config_value, resolve_relative_paths},
    prompt::PromptTemplate,
    schema::EnvoyConfig,
};

/// Reserved command word; a source cannot use it as id.
pub const VERIFY_COMMAND: &str = "verify";

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "credentials",
    /// "sources", "receivers", "template", "env", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "sources[0].id"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}]: {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Turn error diagnostics into a startup failure.
    pub fn into_result(self) -> Result<Vec<Diagnostic>> {
        let errors = self.count(Severity::Error);
        if errors == 0 {
            return Ok(self.diagnostics);
        }
        let summary = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::ConfigInvalid { errors, summary })
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    /// A table with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    Struct(HashMap::from([
        ("log_level", Leaf),
        ("summary_receivers", Leaf),
        (
            "telegram",
            Struct(HashMap::from([
                ("token", Leaf),
                ("poll_timeout_secs", Leaf),
                ("api_url", Leaf),
            ])),
        ),
        (
            "llm",
            Struct(HashMap::from([
                ("api_key", Leaf),
                ("model", Leaf),
                ("base_url", Leaf),
                ("system_prompt", Leaf),
            ])),
        ),
        (
            "sources",
            Array(Box::new(Struct(HashMap::from([
                ("id", Leaf),
                ("chat", Leaf),
                ("lookback_period_seconds", Leaf),
                ("lookback_seconds", Leaf),
                ("summarization_prompt_path", Leaf),
                ("prompt_template_path", Leaf),
            ])))),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one when
/// `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        let mut result = ValidationResult::default();
        result.push(
            Severity::Error,
            "file-ref",
            "",
            "no config file found; run `envoy init` to create one",
        );
        return result;
    };

    let mut result = match std::fs::read_to_string(&config_path) {
        Ok(raw) => validate_str(&raw, &config_path),
        Err(e) => {
            let mut result = ValidationResult::default();
            result.push(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            );
            result
        },
    };
    result.config_path = Some(config_path);
    result
}

/// Validate raw config text. `path` selects the format by extension and is
/// the base for relative prompt paths.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();
    let substituted = substitute_env(raw);

    for name in unresolved_vars(&substituted) {
        result.push(
            Severity::Warning,
            "env",
            "",
            format!("environment variable {name} is not set"),
        );
    }

    let value = match parse_config_value(&substituted, path) {
        Ok(v) => v,
        Err(e) => {
            result.push(Severity::Error, "syntax", "", format!("syntax error: {e}"));
            return result;
        },
    };

    check_unknown_fields(&value, &build_schema_map(), "", &mut result);

    let mut config: EnvoyConfig = match serde_json::from_value(value) {
        Ok(c) => c,
        Err(e) => {
            result.push(Severity::Error, "type-error", "", format!("type error: {e}"));
            return result;
        },
    };
    resolve_relative_paths(&mut config, path);

    check_config(&config, &mut result);
    result
}

/// Semantic checks on an already-parsed config.
pub fn check_config(config: &EnvoyConfig, result: &mut ValidationResult) {
    check_credentials(config, result);
    check_receivers(config, result);
    check_sources(config, result);
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    result: &mut ValidationResult,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child, child_schema, &path, result);
                    continue;
                }
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                result.push(Severity::Error, "unknown-field", path, message);
            }
        },
        (serde_json::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                check_unknown_fields(item, item_schema, &format!("{prefix}[{i}]"), result);
            }
        },
        // Leaf or type mismatch (caught by deserialization).
        _ => {},
    }
}

fn check_credentials(config: &EnvoyConfig, result: &mut ValidationResult) {
    use secrecy::ExposeSecret;

    let token = config
        .telegram
        .get("token")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if token.trim().is_empty() {
        result.push(
            Severity::Error,
            "credentials",
            "telegram.token",
            "bot token is required",
        );
    }
    if config.llm.api_key.expose_secret().trim().is_empty() {
        result.push(
            Severity::Error,
            "credentials",
            "llm.api_key",
            "api key is required",
        );
    }
    if config.llm.model.trim().is_empty() {
        result.push(Severity::Error, "credentials", "llm.model", "model is empty");
    }
}

fn check_receivers(config: &EnvoyConfig, result: &mut ValidationResult) {
    if config.summary_receivers.is_empty() {
        result.push(
            Severity::Warning,
            "receivers",
            "summary_receivers",
            "no receivers configured; nobody can use the bot",
        );
    }
    let mut seen = HashSet::new();
    for (i, alias) in config.summary_receivers.iter().enumerate() {
        let path = format!("summary_receivers[{i}]");
        if alias.trim().is_empty() {
            result.push(Severity::Error, "receivers", path, "receiver alias is empty");
        } else if alias.starts_with('@') {
            result.push(
                Severity::Warning,
                "receivers",
                path,
                format!("\"{alias}\" starts with '@'; usernames are matched without it"),
            );
        } else if !seen.insert(alias.to_lowercase()) {
            result.push(
                Severity::Warning,
                "receivers",
                path,
                format!("duplicate receiver \"{alias}\""),
            );
        }
    }
}

fn check_sources(config: &EnvoyConfig, result: &mut ValidationResult) {
    if config.sources.is_empty() {
        result.push(
            Severity::Warning,
            "sources",
            "sources",
            "no sources configured; nothing will be summarized",
        );
    }

    let mut seen = HashSet::new();
    for (i, source) in config.sources.iter().enumerate() {
        let prefix = format!("sources[{i}]");
        let id = source.id.as_str();

        if id.is_empty() {
            result.push(
                Severity::Error,
                "sources",
                format!("{prefix}.id"),
                "source id is empty",
            );
        } else if id.contains('/') || id.chars().any(char::is_whitespace) {
            result.push(
                Severity::Error,
                "sources",
                format!("{prefix}.id"),
                format!("source id \"{id}\" must not contain '/' or whitespace"),
            );
        } else if id == VERIFY_COMMAND {
            result.push(
                Severity::Error,
                "sources",
                format!("{prefix}.id"),
                "\"verify\" is reserved for the verification command",
            );
        } else if !seen.insert(id) {
            result.push(
                Severity::Error,
                "sources",
                format!("{prefix}.id"),
                format!("duplicate source id \"{id}\""),
            );
        }

        if source.chat.is_none() && !id.is_empty() {
            result.push(
                Severity::Info,
                "sources",
                format!("{prefix}.chat"),
                format!("no chat set; messages are read from chat \"{id}\""),
            );
        }

        if source.lookback_period_seconds == 0 {
            result.push(
                Severity::Error,
                "sources",
                format!("{prefix}.lookback_period_seconds"),
                "lookback period must be positive",
            );
        }

        if let Err(e) = PromptTemplate::load(&source.summarization_prompt_path) {
            result.push(
                Severity::Error,
                "template",
                format!("{prefix}.summarization_prompt_path"),
                e.to_string(),
            );
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
