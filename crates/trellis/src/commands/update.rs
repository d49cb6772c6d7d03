//! Self-update command.

use anyhow::{Context as _, Result};
use clap::Args;

use trellis_install::ReplaceOutcome;
use trellis_update::{
    BUILD_VERSION, SelfUpdater, UpdateReport, UpdateStatus, current_executable,
};

/// Arguments for the `update` command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Only report whether a newer release exists
    #[arg(long)]
    pub check: bool,
}

/// Runs the update command.
pub async fn run(args: UpdateArgs) -> Result<()> {
    let updater =
        SelfUpdater::new("trellis", BUILD_VERSION).context("failed to set up the updater")?;

    if args.check {
        return check(&updater).await;
    }

    let target = current_executable()?;
    println!("Checking for updates...");

    let report = updater
        .update(&target)
        .await
        .context("failed to update trellis")?;

    match report {
        UpdateReport::AlreadyLatest { version } => {
            println!("trellis {version} is already the latest version");
        }
        UpdateReport::Installed {
            tag,
            outcome: ReplaceOutcome::Replaced,
        } => {
            println!("Updated trellis to {tag}");
        }
        UpdateReport::Installed {
            tag,
            outcome: ReplaceOutcome::Staged { path },
        } => {
            println!("Downloaded trellis {tag} to {}", path.display());
            println!(
                "Replace {} with it once trellis is no longer running.",
                target.display()
            );
        }
    }

    Ok(())
}

async fn check(updater: &SelfUpdater) -> Result<()> {
    let status = updater
        .check()
        .await
        .context("failed to check for updates")?;

    match status {
        UpdateStatus::UpToDate { current } => {
            println!("trellis {current} is up to date");
        }
        UpdateStatus::Available {
            current,
            latest,
            notes_url,
        } => {
            println!("trellis {latest} is available (you have {current})");
            if !notes_url.is_empty() {
                println!("Release notes: {notes_url}");
            }
            println!("Run 'trellis update' to upgrade.");
        }
    }

    Ok(())
}
