//! Agent configuration and the persisted settings file.

use std::path::{Path, PathBuf};

use anki_sync_core::Settings;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://127.0.0.1:8765";

/// Hidden per-vault directory. Skipped when scanning documents.
pub const STATE_DIR: &str = ".anki-sync";

const SETTINGS_FILE: &str = "settings.json";

/// Where the agent finds the vault, AnkiConnect and its own files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub vault: PathBuf,
    pub anki_url: String,
    pub backup_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl AgentConfig {
    /// Resolve the configuration, filling in defaults for anything not given.
    pub fn new(
        vault: Option<PathBuf>,
        settings_path: Option<PathBuf>,
        anki_url: Option<String>,
    ) -> Result<Self> {
        let vault = match vault {
            Some(vault) => vault,
            None => std::env::current_dir().map_err(|e| ConfigError::Io {
                path: PathBuf::from("."),
                message: e.to_string(),
            })?,
        };
        if !vault.is_dir() {
            return Err(ConfigError::VaultNotFound(vault));
        }

        let anki_url = anki_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ANKI_CONNECT_URL.to_string());
        let settings_path =
            settings_path.unwrap_or_else(|| vault.join(STATE_DIR).join(SETTINGS_FILE));
        let backup_dir = default_backup_dir(&vault);

        Ok(Self {
            vault,
            anki_url,
            backup_dir,
            settings_path,
        })
    }

    pub fn with_backup_dir(mut self, backup_dir: PathBuf) -> Self {
        self.backup_dir = backup_dir;
        self
    }

    pub fn load_settings(&self) -> Result<Settings> {
        load_settings(&self.settings_path)
    }
}

fn default_backup_dir(vault: &Path) -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("anki-vault-sync").join("backups"))
        .unwrap_or_else(|| vault.join(STATE_DIR).join("backups"))
}

/// Read settings, or defaults when the file does not exist yet.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write settings as pretty JSON, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let io_error = |e: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(io_error)?;

    info!(path = %path.display(), "Saved settings");
    Ok(())
}
