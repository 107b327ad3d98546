//! firegate - authenticating reverse proxy for the Firefly III API
//!
//! Main entry point for the firegate CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// firegate - authenticating reverse proxy for the Firefly III API
#[derive(Parser)]
#[command(name = "firegate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file, layered over discovered files
    #[arg(short, long, global = true, env = "FIREGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Start(start::StartArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

const CRATES: [&str; 5] = [
    "firegate",
    "firegate_server",
    "firegate_oauth",
    "firegate_session",
    "firegate_config",
];

fn directives(level: &str, fallback: &str) -> String {
    let mut out: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, level)).collect();
    out.push(fallback.to_string());
    out.join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let console_filter = if cli.verbose {
        directives("debug", "tower_http=debug,info")
    } else {
        directives("info", "warn")
    };

    let log_dir = firegate_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "firegate.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(console_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(directives(
                    "trace", "info",
                ))),
        )
        .init();

    let ctx = commands::Context {
        config_path: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
