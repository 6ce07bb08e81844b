use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::EnvoyConfig,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &["envoy.toml", "envoy.yaml", "envoy.yml", "envoy.json"];

/// Load config from the given path (any supported format).
///
/// `${VAR}` placeholders are substituted before parsing and relative prompt
/// paths are resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<EnvoyConfig> {
    let raw = read_substituted(path)?;
    let mut config = parse_config(&raw, path)?;
    resolve_relative_paths(&mut config, path);
    debug!(
        path = %path.display(),
        sources = config.sources.len(),
        receivers = config.summary_receivers.len(),
        "loaded config"
    );
    Ok(config)
}

/// Load the config file as an untyped JSON value (after env substitution).
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let raw = read_substituted(path)?;
    parse_config_value(&raw, path)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./envoy.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/envoy/envoy.{toml,yaml,yml,json}` (user-global)
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/envoy/`).
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "envoy").map(|d| d.config_dir().to_path_buf())
}

fn read_substituted(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(substitute_env(&raw))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<EnvoyConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        ext => Err(Error::unsupported_format(ext)),
    }
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        ext => Err(Error::unsupported_format(ext)),
    }
}

pub(crate) fn resolve_relative_paths(config: &mut EnvoyConfig, config_path: &Path) {
    let Some(base) = config_path.parent() else {
        return;
    };
    for source in &mut config.sources {
        if source.summarization_prompt_path.is_relative() {
            source.summarization_prompt_path = base.join(&source.summarization_prompt_path);
        }
    }
}
