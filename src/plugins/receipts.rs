//! Install receipts store
//!
//! Each installed plugin has a `<name>.json` receipt in the receipts
//! directory. The store enumerates receipts for the orchestrator and lets
//! the installer read and rewrite individual receipts.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{PlugctlError, Result};
use crate::upgrade::ReceiptStore;

use super::index::ensure_safe_plugin_name;
use super::types::InstalledReceipt;

/// Receipts store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FsReceiptStore {
    dir: PathBuf,
}

impl FsReceiptStore {
    /// Create a store reading and writing receipts in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The receipts directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn receipt_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load the receipt for `name`.
    ///
    /// # Errors
    /// - `PlugctlError::UnsafeName` if `name` is not a safe path component
    /// - `PlugctlError::Receipt` if the plugin is not installed or the
    ///   receipt cannot be read or parsed
    pub async fn load(&self, name: &str) -> Result<InstalledReceipt> {
        ensure_safe_plugin_name(name)?;
        let path = self.receipt_path(name);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PlugctlError::Receipt(format!("plugin {:?} is not installed", name))
            } else {
                PlugctlError::Receipt(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        parse_receipt(&path, &content)
    }

    /// Write `receipt`, replacing any existing receipt for the same name.
    ///
    /// The receipt is written to a temporary file first and then renamed
    /// into place, so readers never observe a half-written receipt.
    pub async fn save(&self, receipt: &InstalledReceipt) -> Result<()> {
        ensure_safe_plugin_name(&receipt.name)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PlugctlError::Receipt(format!(
                "Failed to create receipts directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.receipt_path(&receipt.name);
        let tmp = self.dir.join(format!(".{}.json.tmp", receipt.name));
        let body = serde_json::to_vec_pretty(receipt)?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(plugin = %receipt.name, version = %receipt.version, "Saved receipt");
        Ok(())
    }
}

fn parse_receipt(path: &Path, content: &str) -> Result<InstalledReceipt> {
    serde_json::from_str(content).map_err(|e| {
        PlugctlError::Receipt(format!("Failed to parse {}: {}", path.display(), e))
    })
}

#[async_trait]
impl ReceiptStore for FsReceiptStore {
    async fn list_installed(&self) -> Result<BTreeMap<String, InstalledReceipt>> {
        let mut installed = BTreeMap::new();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(dir = %self.dir.display(), "Receipts directory does not exist, nothing installed");
                return Ok(installed);
            }
            Err(e) => {
                return Err(PlugctlError::Receipt(format!(
                    "Failed to read receipts directory {}: {}",
                    self.dir.display(),
                    e
                )))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_receipt = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some("json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_receipt {
                continue;
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = tokio::fs::read_to_string(&path).await?;
            let receipt = parse_receipt(&path, &content)?;
            if receipt.name != stem {
                return Err(PlugctlError::Receipt(format!(
                    "receipt {} is for plugin {:?}, expected {:?}",
                    path.display(),
                    receipt.name,
                    stem
                )));
            }
            installed.insert(stem, receipt);
        }

        debug!(count = installed.len(), "Listed installed plugins");
        Ok(installed)
    }
}
