//! Start command - launches the proxy server.

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use firegate_config::ResolvedConfig;
use firegate_server::Server;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Address to bind to, e.g. 0.0.0.0:3000 (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Public origin used to build the OAuth redirect URI (overrides config)
    #[arg(long)]
    pub public_url: Option<String>,
}

pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let mut loaded = ctx.load_config()?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using environment + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    if let Some(bind) = args.bind {
        loaded.config.server.bind = Some(bind);
    }
    if let Some(public_url) = args.public_url {
        loaded.config.server.public_url = Some(public_url);
    }

    let resolved = ResolvedConfig::resolve(loaded.config).context("invalid configuration")?;

    if ctx.verbose {
        println!("Bind address: {}", resolved.bind_address);
        println!("Upstream API: {}", resolved.api_root());
        println!("Authorization server: {}", resolved.auth_base_url);
    }

    let server = Server::from_config(&resolved)?;
    info!(bind = %server.bind_address(), "firegate starting");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    Ok(())
}
