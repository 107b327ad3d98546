//! Config command - configuration inspection.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use firegate_config::ResolvedConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets redacted
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Validate the configuration and exit non-zero if it is unusable
    Check,
}

pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Check => cmd_check(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    println!("# firegate configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (environment only)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    match ResolvedConfig::resolve(loaded.config.clone()) {
        Ok(resolved) => {
            println!("{}", resolved.to_redacted_config().to_toml()?);
        }
        Err(e) => {
            println!("Configuration is incomplete: {}\n", e);
            println!("Layers as merged so far:\n");
            println!("{}", loaded.config.redacted().to_toml()?);
        }
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }
    println!("  + environment variables");

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    match ResolvedConfig::resolve(loaded.config) {
        Ok(resolved) => {
            println!("Configuration OK");
            if ctx.verbose {
                println!("  bind: {}", resolved.bind_address);
                println!("  upstream: {}", resolved.api_root());
                println!("  single-flight refresh: {}", resolved.single_flight_refresh);
            }
            Ok(())
        }
        Err(e) => bail!("configuration check failed: {}", e),
    }
}
