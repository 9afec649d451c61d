pub mod anki_connect;
pub mod config;
pub mod error;
pub mod lock;
pub mod vault;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anki_sync_core::{DocumentError, RemoteStore, Settings, SyncCoordinator, SyncError, SyncOutcome};

use crate::anki_connect::{AnkiConnectClient, BackupTarget};
use crate::config::AgentConfig;
use crate::lock::VaultLock;
use crate::vault::FsVault;

#[derive(Parser)]
#[command(name = "anki-vault-sync", about = "Sync Markdown card blocks into Anki", version)]
struct Cli {
    /// Vault directory (default: current directory)
    #[arg(long, global = true, env = "ANKI_SYNC_VAULT")]
    vault: Option<PathBuf>,

    /// Settings file (default: <vault>/.anki-sync/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// AnkiConnect endpoint
    #[arg(long, global = true, env = "ANKI_CONNECT_URL")]
    anki_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push every card block in the vault to Anki
    Sync {
        /// Report orphaned notes instead of deleting them
        #[arg(long)]
        keep_orphans: bool,
    },

    /// Check that AnkiConnect is reachable and grants access
    Check,

    /// Print the resolved configuration and settings
    Settings,

    /// Write a default settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::new(cli.vault, cli.config, cli.anki_url)?;

    match cli.command {
        Command::Sync { keep_orphans } => {
            let mut settings = config.load_settings()?;
            if keep_orphans {
                settings.delete_orphans = false;
            }
            let coordinator = SyncCoordinator::new();
            let outcome = sync_vault(&coordinator, &config, &settings).await;
            match outcome {
                SyncOutcome::Completed(_) => println!("{}", outcome.message()),
                _ => bail!("{}", outcome.message()),
            }
        }
        Command::Check => {
            let settings = config.load_settings()?;
            let client = client_for(&config, &settings);
            let version = client
                .version()
                .await
                .with_context(|| format!("AnkiConnect not reachable at {}", config.anki_url))?;
            client
                .request_permission()
                .await
                .context("AnkiConnect refused access")?;
            println!(
                "AnkiConnect {} reachable (API version {}), access granted",
                config.anki_url, version
            );
        }
        Command::Settings => {
            let settings = config.load_settings()?;
            println!("vault:         {}", config.vault.display());
            println!("anki url:      {}", config.anki_url);
            println!("settings file: {}", config.settings_path.display());
            println!("backup dir:    {}", config.backup_dir.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Init { force } => {
            if config.settings_path.exists() && !force {
                println!(
                    "Settings already exist at {} (use --force to overwrite)",
                    config.settings_path.display()
                );
            } else {
                config::save_settings(&config.settings_path, &Settings::default())?;
                println!("Wrote default settings to {}", config.settings_path.display());
            }
        }
    }

    Ok(())
}

/// AnkiConnect client for a resolved configuration.
pub fn client_for(config: &AgentConfig, settings: &Settings) -> AnkiConnectClient {
    AnkiConnectClient::new(
        &config.anki_url,
        BackupTarget {
            dir: config.backup_dir.clone(),
            deck: settings.default_deck.clone(),
        },
    )
}

/// Run one sync of the configured vault.
///
/// Overlapping calls on one `coordinator` are rejected, and so is a run while
/// another process holds the vault's lock file.
pub async fn sync_vault(
    coordinator: &SyncCoordinator,
    config: &AgentConfig,
    settings: &Settings,
) -> SyncOutcome {
    if coordinator.is_running() {
        return SyncOutcome::AlreadyRunning;
    }

    let _lock = match VaultLock::acquire(&config.vault) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            tracing::warn!(
                lock = %VaultLock::path_for(&config.vault).display(),
                "Another sync holds the vault lock"
            );
            return SyncOutcome::AlreadyRunning;
        }
        Err(e) => {
            let error = SyncError::Document(DocumentError::Io {
                path: VaultLock::path_for(&config.vault).display().to_string(),
                message: e.to_string(),
            });
            let hint = error.hint();
            return SyncOutcome::Failed { error, hint };
        }
    };

    let vault = FsVault::new(&config.vault);
    let client = client_for(config, settings);

    tracing::info!("Starting sync for vault {}...", config.vault.display());
    coordinator.start_sync(&vault, &client, settings).await
}
