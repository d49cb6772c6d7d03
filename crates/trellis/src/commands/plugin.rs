//! Plugin management commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use trellis_install::{InstalledIndex, PluginInstaller, UpdateOutcome, verify_download_urls};
use trellis_registry::{RegistryManifest, ValidationOptions, validate_manifest};

use super::Context;

/// Plugin management commands.
#[derive(Debug, Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommand,
}

#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// Search the configured registries
    Search(SearchArgs),

    /// Show information about a plugin
    Info(InfoArgs),

    /// Install a plugin
    Install(InstallArgs),

    /// Update installed plugins
    Update(UpdateArgs),

    /// Remove an installed plugin
    Remove(RemoveArgs),

    /// List installed plugins
    List,

    /// Validate a manifest file
    Validate(ValidateArgs),
}

/// Arguments for the `plugin search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search query (lists every plugin when omitted)
    pub query: Option<String>,
}

/// Arguments for the `plugin info` command.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Plugin name
    pub name: String,
}

/// Arguments for the `plugin install` command.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Plugin name, optionally pinned as `name@version`
    pub plugin: String,
}

/// Arguments for the `plugin update` command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Plugin name (updates all if not specified)
    pub name: Option<String>,
}

/// Arguments for the `plugin remove` command.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Plugin name
    pub name: String,
}

/// Arguments for the `plugin validate` command.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to a manifest.json
    pub file: PathBuf,

    /// Check minEngineVersion against this host version
    #[arg(long, value_name = "VERSION")]
    pub engine_version: Option<String>,

    /// Require a download for this OS (use with --arch)
    #[arg(long, requires = "arch")]
    pub os: Option<String>,

    /// Require a download for this architecture (use with --os)
    #[arg(long, requires = "os")]
    pub arch: Option<String>,

    /// Also check that every download URL is reachable
    #[arg(long)]
    pub verify_urls: bool,
}

/// Runs the plugin command.
pub async fn run(ctx: &Context, args: PluginArgs) -> Result<()> {
    match args.command {
        PluginCommand::Search(args) => search(ctx, args).await,
        PluginCommand::Info(args) => info(ctx, args).await,
        PluginCommand::Install(args) => install(ctx, args).await,
        PluginCommand::Update(args) => update(ctx, args).await,
        PluginCommand::Remove(ref args) => remove(ctx, args),
        PluginCommand::List => list(ctx),
        PluginCommand::Validate(args) => validate(args).await,
    }
}

async fn search(ctx: &Context, args: SearchArgs) -> Result<()> {
    let registries = ctx.registries()?;
    let query = args.query.unwrap_or_default();

    let results = registries.search_plugins(&query).await;
    if results.is_empty() {
        println!("No plugins found.");
        return Ok(());
    }

    for result in &results {
        let summary = &result.summary;
        println!(
            "{} v{} [{}] ({})",
            summary.name, summary.version, summary.tier, result.source
        );
        if !summary.description.is_empty() {
            println!("    {}", summary.description);
        }
    }

    Ok(())
}

async fn info(ctx: &Context, args: InfoArgs) -> Result<()> {
    let registries = ctx.registries()?;
    let (manifest, source) = registries
        .fetch_manifest(&args.name)
        .await
        .with_context(|| format!("failed to look up {}", args.name))?;

    println!("{} v{}", manifest.name, manifest.version);
    println!("  Registry:    {source}");
    println!("  Author:      {}", manifest.author);
    println!("  Type:        {}", manifest.plugin_type);
    println!("  Tier:        {}", manifest.tier);
    println!("  License:     {}", manifest.license);
    if !manifest.min_engine_version.is_empty() {
        println!("  Min engine:  {}", manifest.min_engine_version);
    }
    if let Some(repository) = &manifest.repository {
        println!("  Repository:  {repository}");
    }
    if let Some(homepage) = &manifest.homepage {
        println!("  Homepage:    {homepage}");
    }
    if !manifest.keywords.is_empty() {
        println!("  Keywords:    {}", manifest.keywords.join(", "));
    }
    if !manifest.description.is_empty() {
        println!();
        println!("  {}", manifest.description);
    }

    if !manifest.downloads.is_empty() {
        println!();
        println!("  Platforms:");
        for download in &manifest.downloads {
            println!("    {}/{}", download.os, download.arch);
        }
    }

    let storage = ctx.storage()?;
    let index = InstalledIndex::load(storage.index_path())?;
    if let Some(installed) = index.get(&manifest.name) {
        println!();
        println!("  Installed:   v{}", installed.version);
    }

    Ok(())
}

async fn install(ctx: &Context, args: InstallArgs) -> Result<()> {
    let (name, pin) = parse_plugin_spec(&args.plugin);

    println!("Installing {name}...");

    let registries = ctx.registries()?;
    let mut installer = PluginInstaller::new(&registries, ctx.storage()?)
        .context("failed to load installed plugins")?;

    let plugin = installer
        .install(name, pin)
        .await
        .with_context(|| format!("failed to install {name}"))?;

    println!(
        "Installed {} v{} (from {})",
        plugin.name, plugin.version, plugin.source
    );

    Ok(())
}

async fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let registries = ctx.registries()?;
    let mut installer = PluginInstaller::new(&registries, ctx.storage()?)
        .context("failed to load installed plugins")?;

    let names: Vec<String> = match args.name {
        Some(name) => vec![name],
        None => installer.list().into_iter().map(|p| p.name.clone()).collect(),
    };

    if names.is_empty() {
        println!("No plugins installed.");
        return Ok(());
    }

    let mut updated = 0;
    let mut up_to_date = 0;
    let mut errors = 0;

    for name in &names {
        match installer.update(name).await {
            Ok(UpdateOutcome::Updated { from, plugin }) => {
                println!("{name}: updated {from} -> {}", plugin.version);
                updated += 1;
            }
            Ok(UpdateOutcome::UpToDate { version }) => {
                println!("{name}: up to date ({version})");
                up_to_date += 1;
            }
            Err(e) => {
                println!("{name}: error: {e}");
                errors += 1;
            }
        }
    }

    if names.len() > 1 {
        println!();
        if updated > 0 {
            println!("Updated {updated} plugin(s)");
        }
        if up_to_date > 0 {
            println!("{up_to_date} plugin(s) already up to date");
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} plugin(s) failed to update");
    }

    Ok(())
}

fn remove(ctx: &Context, args: &RemoveArgs) -> Result<()> {
    let storage = ctx.storage()?;
    let registries = ctx.registries()?;
    let mut installer =
        PluginInstaller::new(&registries, storage).context("failed to load installed plugins")?;

    let plugin = installer
        .remove(&args.name)
        .with_context(|| format!("failed to remove {}", args.name))?;

    println!("Removed {} v{}", plugin.name, plugin.version);

    Ok(())
}

fn list(ctx: &Context) -> Result<()> {
    let storage = ctx.storage()?;
    let index = InstalledIndex::load(storage.index_path())?;
    let plugins = index.list();

    if plugins.is_empty() {
        println!("No plugins installed.");
        return Ok(());
    }

    println!("Installed plugins:");
    for plugin in plugins {
        println!(
            "  {} v{} [{}] from {} ({})",
            plugin.name,
            plugin.version,
            plugin.tier,
            plugin.source,
            plugin.installed_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

async fn validate(args: ValidateArgs) -> Result<()> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let manifest = RegistryManifest::from_json(&content)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let (target_os, target_arch) = match (args.os, args.arch) {
        (Some(os), Some(arch)) => (os, arch),
        _ => (String::new(), String::new()),
    };
    let options = ValidationOptions {
        verify_urls: args.verify_urls,
        target_os,
        target_arch,
        engine_version: args.engine_version.unwrap_or_default(),
        ..ValidationOptions::default()
    };

    let mut errors = validate_manifest(&manifest, &options);
    if options.verify_urls {
        errors.extend(verify_download_urls(&manifest).await?);
    }

    if errors.is_empty() {
        println!("{} is valid", args.file.display());
        return Ok(());
    }

    for error in &errors {
        println!("{error}");
    }
    anyhow::bail!(
        "{} failed validation with {} error(s)",
        args.file.display(),
        errors.len()
    );
}

/// Splits `name@version` into its parts.
fn parse_plugin_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once('@') {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (spec, None),
    }
}
