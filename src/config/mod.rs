//! Configuration for plugctl
//!
//! All on-disk state lives under a single root directory, `~/.plugctl` by
//! default or `$PLUGCTL_ROOT` when set:
//!
//! ```text
//! ~/.plugctl/
//! ├── config.json
//! ├── index/
//! │   └── plugins/
//! │       └── <name>.json
//! └── receipts/
//!     └── <name>.json
//! ```
//!
//! The loaded [`Config`] is passed explicitly to the backends that need
//! paths; nothing reads a process-wide path object.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlugctlError, Result};

/// Environment variable overriding the root directory.
pub const ROOT_ENV: &str = "PLUGCTL_ROOT";

const INDEX_REMOTE_ENV: &str = "PLUGCTL_INDEX_REMOTE";
const INDEX_AUTO_UPDATE_ENV: &str = "PLUGCTL_INDEX_AUTO_UPDATE";

/// Settings for the local copy of the plugin index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Refresh the index before commands that read it. Defaults to true.
    pub auto_update: bool,
    /// Git URL the index is cloned from when no local checkout exists.
    pub remote: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            auto_update: true,
            remote: None,
        }
    }
}

/// Top-level configuration, stored in `<root>/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index settings.
    pub index: IndexConfig,

    /// Root directory this config was loaded from.
    #[serde(skip)]
    root: PathBuf,
}

impl Config {
    /// The root directory: `$PLUGCTL_ROOT` if set, otherwise `~/.plugctl`.
    pub fn dir() -> PathBuf {
        if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(root);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".plugctl")
    }

    /// Path of the config file under the default root.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load the configuration from the default root, applying env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::dir())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load `config.json` from `root`. A missing file yields the defaults.
    pub fn load_from(root: &Path) -> Result<Self> {
        let path = root.join("config.json");
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                PlugctlError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str::<Config>(&content).map_err(|e| {
                PlugctlError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Config::default()
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Apply overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(remote) = lookup(INDEX_REMOTE_ENV).filter(|v| !v.trim().is_empty()) {
            self.index.remote = Some(remote.trim().to_string());
        }
        if let Some(raw) = lookup(INDEX_AUTO_UPDATE_ENV) {
            self.index.auto_update = parse_bool(&raw).ok_or_else(|| {
                PlugctlError::Config(format!(
                    "{} must be a boolean, got {:?}",
                    INDEX_AUTO_UPDATE_ENV, raw
                ))
            })?;
        }
        Ok(())
    }

    /// Root directory of all plugctl state.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local checkout of the plugin index.
    pub fn index_path(&self) -> PathBuf {
        self.root.join("index")
    }

    /// Directory holding one manifest per plugin.
    pub fn index_plugins_path(&self) -> PathBuf {
        self.index_path().join("plugins")
    }

    /// Directory holding one install receipt per plugin.
    pub fn install_receipts_path(&self) -> PathBuf {
        self.root.join("receipts")
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
