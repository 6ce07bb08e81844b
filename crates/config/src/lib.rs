//! Configuration loading and validation.
//!
//! Config files: `envoy.toml`, `envoy.yaml`, or `envoy.json`
//! Searched in `./` then `~/.config/envoy/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod prompt;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, find_config_file, load_config, load_config_value},
    prompt::{PromptTemplate, TEXT_PLACEHOLDER},
    schema::{EnvoyConfig, LlmConfig, SourceConfig},
    validate::{Diagnostic, Severity, ValidationResult, VERIFY_COMMAND},
};
