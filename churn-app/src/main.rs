use anyhow::{Context, Result};
use churn_common::observability::{LogConfig, LogFormat, init_logging};
use churn_config::{ChurnConfig, ChurnConfigLoader};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tether::Tether;
mod tether;

#[derive(Debug, Parser)]
#[command(name = "churn", version, about = "Daily follower churn and weather bot")]
struct Cli {
    /// Configuration file; optional when everything comes from `CHURN__*` variables.
    #[arg(long, short, global = true, env = "CHURN_CONFIG", default_value = "churn.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one daily cycle: update, post, refresh weather, save.
    Run {
        /// Print posts instead of sending them and leave the state file untouched.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print tomorrow's forecast line.
    Weather {
        /// City name in romaji or kanji; defaults to the configured city.
        #[arg(long)]
        city: Option<String>,
    },
}

fn log_config(cfg: &ChurnConfig) -> Result<LogConfig> {
    let format: LogFormat = cfg
        .logging
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format,
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: ChurnConfig = ChurnConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(log_config(&cfg)?)?;
    tracing::debug!(log_path=%log_path.display(), "app.logging_ready");

    let tether = Tether::new(cfg);
    match cli.command {
        Command::Run { dry_run } => tether.run_cycle(dry_run).await,
        Command::Weather { city } => tether.print_weather(city.as_deref()).await,
    }
}
