mod config_commands;
mod run_command;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use envoy_config::{Severity, validate};

#[derive(Parser)]
#[command(name = "envoy", about = "Envoy: chat summaries delivered over Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./envoy.toml, then ~/.config/envoy/).
    #[arg(long, short, global = true, env = "ENVOY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides `log_level`
    /// from the config file; `RUST_LOG` overrides both.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Write a starter config file and an example prompt.
    Init {
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },
}

fn init_telemetry(json_logs: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check { verbose }) => config_commands::check(cli.config.as_deref(), verbose),
        Some(Commands::Init { dir, force }) => config_commands::init(&dir, force),
        None | Some(Commands::Run) => run(&cli).await,
    }
}

/// Validate, load, start. Any configuration error stops here.
async fn run(cli: &Cli) -> anyhow::Result<()> {
    let validation = validate::validate(cli.config.as_deref());
    let config = match (&validation.config_path, validation.has_errors()) {
        (Some(path), false) => Some(
            envoy_config::load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
        ),
        _ => None,
    };

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".into());
    init_telemetry(cli.json_logs, &level);
    info!(version = env!("CARGO_PKG_VERSION"), "envoy starting");

    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!(category = d.category, path = %d.path, "{}", d.message),
            Severity::Warning => warn!(category = d.category, path = %d.path, "{}", d.message),
            Severity::Info => info!(category = d.category, path = %d.path, "{}", d.message),
        }
    }
    if let Some(path) = &validation.config_path {
        info!(path = %path.display(), "using config file");
    }
    validation.into_result()?;

    let config = config.context("no configuration loaded")?;
    run_command::run(config).await
}
