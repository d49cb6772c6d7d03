//! Registry configuration commands.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use trellis_config::{RegistrySourceConfig, save_config};

use super::Context;

/// Registry configuration commands.
#[derive(Debug, Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

#[derive(Debug, Subcommand)]
pub enum RegistryCommand {
    /// List configured registries in resolution order
    List,

    /// Add a GitHub-hosted registry
    Add(AddArgs),

    /// Remove a registry
    Remove(RemoveArgs),
}

/// Arguments for the `registry add` command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique registry name
    pub name: String,

    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Branch holding the catalog
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Lower values are consulted first
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub priority: i32,
}

/// Arguments for the `registry remove` command.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Registry name
    pub name: String,
}

/// Runs the registry command.
pub fn run(ctx: &Context, args: RegistryArgs) -> Result<()> {
    match args.command {
        RegistryCommand::List => list(ctx),
        RegistryCommand::Add(args) => add(ctx, args),
        RegistryCommand::Remove(ref args) => remove(ctx, args),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    let mut registries: Vec<_> = loaded.config.registries.iter().collect();
    registries.sort_by_key(|r| r.priority);

    println!("Registries ({}):", loaded.path.display());
    for registry in registries {
        println!(
            "  {} [{}] {}/{}@{} priority {}",
            registry.name,
            registry.source_type,
            registry.owner,
            registry.repo,
            registry.branch,
            registry.priority
        );
    }

    Ok(())
}

fn add(ctx: &Context, args: AddArgs) -> Result<()> {
    let mut loaded = ctx.load_config()?;

    let registry = RegistrySourceConfig::github(&args.name, &args.owner, &args.repo)
        .with_branch(args.branch)
        .with_priority(args.priority);
    loaded
        .config
        .add_registry(registry)
        .with_context(|| format!("failed to add registry {}", args.name))?;

    save_config(&loaded.path, &loaded.config)
        .with_context(|| format!("failed to write {}", loaded.path.display()))?;

    println!("Added registry {}", args.name);

    Ok(())
}

fn remove(ctx: &Context, args: &RemoveArgs) -> Result<()> {
    let mut loaded = ctx.load_config()?;

    loaded
        .config
        .remove_registry(&args.name)
        .with_context(|| format!("failed to remove registry {}", args.name))?;

    save_config(&loaded.path, &loaded.config)
        .with_context(|| format!("failed to write {}", loaded.path.display()))?;

    println!("Removed registry {}", args.name);

    Ok(())
}
