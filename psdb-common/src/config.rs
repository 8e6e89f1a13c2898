//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PSDB_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "psdb.db";

/// Upload storage directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and upload storage
    #[serde(default)]
    pub root_folder: Option<String>,

    /// Curator service settings
    #[serde(default)]
    pub curator: CuratorSection,
}

/// `[curator]` table of the TOML configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorSection {
    /// Socket address the HTTP server binds to
    pub bind_address: String,

    /// Per-file upload size ceiling in bytes
    pub max_upload_bytes: u64,

    /// Token required in `x-admin-token` for admin routes (unset disables the check)
    pub admin_token: Option<String>,

    /// Seconds between background sweeps of the file journal and pending storage
    pub sweep_interval_secs: u64,

    /// Minimum age before an unreferenced pending file is considered orphaned
    pub orphan_grace_secs: u64,
}

impl Default for CuratorSection {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5740".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            admin_token: None,
            sweep_interval_secs: 15 * 60,
            orphan_grace_secs: 24 * 60 * 60,
        }
    }
}

/// Load the TOML configuration file.
///
/// A missing file is not an error: defaults are returned and a warning logged.
/// A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Default configuration file path for the platform (`<config dir>/psdb/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("psdb").join("config.toml"))
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. `PSDB_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    default_root_folder()
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("psdb"))
        .unwrap_or_else(|| PathBuf::from("./psdb_data"))
}

/// Resolved root folder and the paths derived from it
#[derive(Debug, Clone)]
pub struct RootFolder {
    path: PathBuf,
}

impl RootFolder {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.path)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.path.join(DATABASE_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.path.join(UPLOADS_DIR)
    }
}
