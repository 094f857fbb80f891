//! folio-sync CLI
//!
//! Pulls content from Notion into the site's data and page directories.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use folio_sync::{
    error::Result,
    models::{ContentKind, StorageMode, SyncConfig},
    pipeline::{
        self, AssetManifest, SyncCheckpoints, SyncContext, SyncRequest, migrate_assets,
        preflight, sweep_assets,
    },
    utils::log as report,
};

/// folio-sync - Notion to static-site content sync
#[derive(Parser, Debug)]
#[command(name = "folio-sync", version, about = "Sync portfolio content from Notion")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch changed content and rewrite snapshots
    Sync {
        /// Ignore checkpoints and refetch every item
        #[arg(long)]
        force: bool,

        /// Override the configured asset storage (local or s3)
        #[arg(long)]
        storage: Option<StorageMode>,

        /// Only sync these kinds (repeatable)
        #[arg(long, value_name = "KIND")]
        only: Vec<ContentKind>,
    },

    /// Prune the asset manifest and remove local copies already stored remotely
    Sweep,

    /// Copy local assets into the remote store
    Migrate,

    /// Validate configuration
    Validate,

    /// Show configuration and checkpoint state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &Path) -> SyncConfig {
    let mut config = if path.exists() {
        SyncConfig::load_or_default(path)
    } else {
        log::debug!("No config file at {}, using defaults", path.display());
        SyncConfig::default()
    };
    config.apply_env();
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.config);

    match cli.command {
        Command::Sync {
            force,
            storage,
            only,
        } => {
            if let Some(mode) = storage {
                config.storage.mode = mode;
            }
            preflight(&config)?;

            let mut ctx = SyncContext::from_config(config).await?;
            let summary = pipeline::run_sync(&mut ctx, &SyncRequest { force, only }).await;
            summary.log();
            if !summary.succeeded() {
                std::process::exit(1);
            }
        }

        Command::Sweep => {
            preflight(&config)?;
            let mut ctx = SyncContext::from_config(config).await?;
            let sweep = sweep_assets(&mut ctx).await?;
            report::summary(
                "Sweep complete",
                &[
                    ("pruned entries", sweep.pruned_entries.to_string()),
                    ("deleted files", sweep.deleted_files.to_string()),
                    ("kept files", sweep.kept_files.to_string()),
                ],
            );
        }

        Command::Migrate => {
            config.storage.mode = StorageMode::S3;
            preflight(&config)?;
            let ctx = SyncContext::from_config(config).await?;
            let migration = migrate_assets(&ctx).await?;
            report::summary(
                "Migration complete",
                &[
                    ("migrated", migration.migrated.to_string()),
                    ("failed", migration.failed.to_string()),
                ],
            );
            if migration.failed > 0 {
                std::process::exit(1);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = preflight(&config) {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for kind in ContentKind::SYNC_ORDER {
                if config.collections.get(kind).is_none() {
                    log::warn!("No collection id for {}", kind);
                }
            }
            log::info!("Config OK");
        }

        Command::Info => {
            let paths = &config.paths;
            report::header("folio-sync");
            log::info!("Storage mode: {}", config.storage.mode);
            log::info!("Data directory: {}", paths.data_dir.display());
            log::info!("Pages directory: {}", paths.pages_dir.display());
            log::info!("Images: {} ({})", paths.images_dir.display(), paths.images_url);

            let manifest = AssetManifest::load(&paths.manifest_file).await?;
            log::info!("Manifest entries: {}", manifest.len());

            let checkpoints = SyncCheckpoints::load(&paths.checkpoints_file).await?;
            if checkpoints.is_empty() {
                log::info!("No sync has run yet.");
            }
            for kind in ContentKind::SYNC_ORDER {
                let configured = config.collections.get(kind).is_some();
                let last = checkpoints.collection_last_sync(kind).unwrap_or("never");
                report::sub_item(&format!(
                    "{:<16} {:<14} last sync: {}",
                    kind.as_str(),
                    if configured { "configured" } else { "not configured" },
                    last
                ));
            }
        }
    }

    Ok(())
}
