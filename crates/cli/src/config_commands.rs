use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use envoy_config::{
    Severity,
    template::{EXAMPLE_PROMPT, default_config_template},
    validate,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Relative path of the prompt written by `init`, also referenced from the
/// config it writes.
const EXAMPLE_PROMPT_PATH: &str = "prompts/example.txt";

pub fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

pub fn init(dir: &Path, force: bool) -> Result<()> {
    for path in write_starter_files(dir, force)? {
        eprintln!("Wrote {}", path.display());
    }
    eprintln!("\nAdd a [[sources]] block, export TELEGRAM_BOT_TOKEN and OPENAI_API_KEY,");
    eprintln!("then run `envoy check`.");
    Ok(())
}

/// Write `envoy.toml` and the example prompt into `dir`.
fn write_starter_files(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let config_path = dir.join("envoy.toml");
    let prompt_path = dir.join(EXAMPLE_PROMPT_PATH);

    if !force {
        for path in [&config_path, &prompt_path] {
            if path.exists() {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
        }
    }

    if let Some(parent) = prompt_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let config = default_config_template().replace("prompts/news.txt", EXAMPLE_PROMPT_PATH);
    std::fs::write(&config_path, config)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    std::fs::write(&prompt_path, EXAMPLE_PROMPT)
        .with_context(|| format!("failed to write {}", prompt_path.display()))?;

    Ok(vec![config_path, prompt_path])
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, envoy_config::PromptTemplate};

    #[test]
    fn init_writes_config_and_prompt() {
        let dir = tempfile::tempdir().unwrap();

        let written = write_starter_files(dir.path(), false).unwrap();

        assert_eq!(written.len(), 2);
        let config = std::fs::read_to_string(dir.path().join("envoy.toml")).unwrap();
        assert!(config.contains(EXAMPLE_PROMPT_PATH));
        PromptTemplate::load(&dir.path().join(EXAMPLE_PROMPT_PATH)).unwrap();
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("envoy.toml"), "log_level = \"debug\"\n").unwrap();

        let err = write_starter_files(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("envoy.toml")).unwrap(),
            "log_level = \"debug\"\n"
        );

        write_starter_files(dir.path(), true).unwrap();
        assert!(dir.path().join(EXAMPLE_PROMPT_PATH).exists());
    }

    #[test]
    fn written_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        write_starter_files(dir.path(), false).unwrap();

        let result = validate::validate(Some(dir.path().join("envoy.toml").as_path()));
        assert!(
            result
                .diagnostics
                .iter()
                .all(|d| d.category != "syntax" && d.category != "unknown-field"),
            "{:?}",
            result.diagnostics
        );
    }
}
