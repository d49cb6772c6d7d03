//! CLI definition.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use trellis_update::{
    BUILD_VERSION, NOTICE_BUDGET, SelfUpdater, UpdateNotice, notice_enabled,
};

use crate::commands::{self, Context};

/// Install, validate and update host plugins from multiple registries.
#[derive(Debug, Parser)]
#[command(name = "trellis")]
#[command(version = BUILD_VERSION, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to use instead of the search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding installed plugins
    #[arg(long, global = true, value_name = "DIR", env = "TRELLIS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search, install and validate plugins
    Plugin(commands::plugin::PluginArgs),

    /// Manage the registries plugins are resolved from
    Registry(commands::registry::RegistryArgs),

    /// Update trellis to the latest release
    Update(commands::update::UpdateArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;

        rt.block_on(self.run_async())
    }

    async fn run_async(self) -> Result<()> {
        let notice = self.start_update_notice();
        let ctx = Context {
            config: self.config,
            data_dir: self.data_dir,
        };

        let result = match self.command {
            Commands::Plugin(args) => commands::plugin::run(&ctx, args).await,
            Commands::Registry(args) => commands::registry::run(&ctx, args),
            Commands::Update(args) => commands::update::run(args).await,
        };

        if let Some(message) = notice.finish(NOTICE_BUDGET).await {
            eprintln!("\n{message}\n");
        }

        result
    }

    fn start_update_notice(&self) -> UpdateNotice {
        if matches!(self.command, Commands::Update(_)) || !notice_enabled(BUILD_VERSION) {
            return UpdateNotice::disabled();
        }

        match SelfUpdater::new("trellis", BUILD_VERSION) {
            Ok(updater) => UpdateNotice::spawn(updater),
            Err(e) => {
                tracing::debug!(error = %e, "update notice unavailable");
                UpdateNotice::disabled()
            }
        }
    }
}
