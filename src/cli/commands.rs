//! Command handlers for Media Archiver CLI
//!
//! This module connects parsed arguments and loaded configuration to the
//! batch archiver.

use tracing::{error, info, warn};

use crate::app::{load_items, BatchArchiver, BatchRequest, BatchSummary, Item};
use crate::cli::{ArchiveArgs, ConfigAction, ConfigArgs, GlobalArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the archive command
///
/// Builds the batch from the manifest file and `--item` pairs, applies CLI
/// overrides on top of the loaded configuration, and runs it.
pub async fn handle_archive(
    args: ArchiveArgs,
    mut config: AppConfig,
    global: &GlobalArgs,
) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    apply_overrides(&mut config, &args);
    config.validate()?;

    let items = collect_items(&args).await?;
    info!("Collected {} item(s)", items.len());

    let settings = config.to_archiver_settings();
    let archiver = BatchArchiver::new(&settings)?;

    let request = BatchRequest {
        items,
        concurrency_limit: config.download.concurrency,
        output_name: config.download.output_name.clone(),
        output_dir: config.download.output_dir.clone(),
        replace_partial: args.force,
    };

    match archiver.run(request).await {
        Ok(summary) => {
            if !global.quiet {
                println!("{}", format_summary(&summary));
            }
            Ok(())
        }
        Err(e) => {
            error!("Archive failed ({}): {}", e.category(), e);
            if e.is_recoverable() {
                warn!("This failure may be transient; rerunning the batch could succeed");
            }
            Err(e)
        }
    }
}

/// Handle configuration management
pub async fn handle_config(
    args: ConfigArgs,
    config: Result<AppConfig>,
    global: &GlobalArgs,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = config?;
            print!("{}", config.to_toml_string()?);
            match config.proxy_endpoint() {
                Some(endpoint) => println!("# effective proxy: {}", endpoint),
                None => println!("# effective proxy: direct"),
            }
            Ok(())
        }
        ConfigAction::Init { force } => {
            let path = AppConfig::initialize(global.config.clone(), force).await?;
            if !global.quiet {
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
    }
}

/// Apply command-line values over the file configuration
fn apply_overrides(config: &mut AppConfig, args: &ArchiveArgs) {
    let download = &mut config.download;
    if let Some(concurrency) = args.concurrency {
        download.concurrency = concurrency;
    }
    if let Some(name) = &args.name {
        download.output_name = name.clone();
    }
    if let Some(dir) = &args.output_dir {
        download.output_dir = Some(dir.clone());
    }
    if let Some(proxy) = &args.proxy {
        download.proxy = Some(proxy.clone());
    }
    if let Some(extension) = &args.extension {
        download.entry_extension = extension.clone();
    }
    if args.no_progress {
        download.progress = false;
    }
}

/// Gather items from the manifest file first, then `--item` pairs
async fn collect_items(args: &ArchiveArgs) -> Result<Vec<Item>> {
    let mut items = match &args.input {
        Some(path) => load_items(path).await?,
        None => Vec::new(),
    };

    for spec in &args.items {
        items.push(Item::from_spec(spec)?);
    }
    Ok(items)
}

fn format_summary(summary: &BatchSummary) -> String {
    format!(
        "Archived {} item(s), {} bytes, to {} in {:.1}s",
        summary.entries,
        summary.total_bytes,
        summary.archive_path.display(),
        summary.elapsed.as_secs_f64()
    )
}
