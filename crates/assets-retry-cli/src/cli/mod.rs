//! CLI for the assets retry engine.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Result;
use assets_retry_core::config::{self, RetryConfig};
use clap::{Parser, Subcommand, ValueEnum};

use commands::{run_check, run_render, run_simulate, RenderArgs, SimulateArgs};

/// Top-level CLI for the assets retry engine.
#[derive(Debug, Parser)]
#[command(name = "assets-retry")]
#[command(about = "Retry failed page assets against fallback domains", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Resource kind of the simulated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssetKind {
    Script,
    Link,
    Img,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Validate the configuration and print the normalized rules.
    Check {
        /// Config file (default: ~/.config/assets-retry/config.toml, created if missing).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Embed the rules into an engine template and print the head tag.
    Render {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Engine template containing the __RETRY_OPTIONS__ placeholder, or a
        /// directory holding the plain and minified engines.
        #[arg(long, value_name = "PATH")]
        template: PathBuf,
        /// Reference an emitted script instead of inlining the engine.
        #[arg(long)]
        external: bool,
        /// Directory JS assets are emitted to.
        #[arg(long, default_value = "static/js", value_name = "DIR")]
        dist_dir: String,
        /// Version in the emitted script name.
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        version: String,
        /// Prefix the page serves assets under.
        #[arg(long, default_value = "", value_name = "PREFIX")]
        asset_prefix: String,
    },

    /// Run the retry engine against a simulated network and print what happened.
    Simulate {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Absolute URL of the asset.
        #[arg(long)]
        url: String,
        #[arg(long, value_enum, default_value = "script")]
        kind: AssetKind,
        /// Number of requests for the asset that fail before one succeeds.
        #[arg(long, default_value = "1", value_name = "N")]
        failures: u32,
        /// Treat the asset as a file of this on-demand chunk.
        #[arg(long, value_name = "ID")]
        chunk: Option<String>,
        /// Domains that fail every request.
        #[arg(long = "down", value_name = "DOMAIN")]
        down: Vec<String>,
    },
}

fn load_config(path: Option<&Path>) -> Result<RetryConfig> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Check { config } => {
                let cfg = load_config(config.as_deref())?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_check(&cfg)?;
            }
            CliCommand::Render {
                config,
                template,
                external,
                dist_dir,
                version,
                asset_prefix,
            } => {
                let cfg = load_config(config.as_deref())?;
                run_render(
                    &cfg,
                    &RenderArgs {
                        template: &template,
                        external,
                        dist_dir: &dist_dir,
                        version: &version,
                        asset_prefix: &asset_prefix,
                    },
                )?;
            }
            CliCommand::Simulate {
                config,
                url,
                kind,
                failures,
                chunk,
                down,
            } => {
                let cfg = load_config(config.as_deref())?;
                run_simulate(
                    &cfg,
                    SimulateArgs {
                        url,
                        kind,
                        failures,
                        chunk,
                        down,
                    },
                )
                .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
