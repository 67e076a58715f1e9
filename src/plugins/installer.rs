//! Receipt-recording installer
//!
//! Decides whether a manifest is newer than the installed version and, if
//! so, records the upgrade in the plugin's receipt. Fetching and unpacking
//! plugin artifacts is left to external tooling.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::{PlugctlError, Result};
use crate::upgrade::Installer;

use super::receipts::FsReceiptStore;
use super::types::{parse_version, Manifest, UpgradeStatus};

/// Installer that upgrades plugins by rewriting their receipts.
#[derive(Debug, Clone)]
pub struct ReceiptInstaller {
    receipts: FsReceiptStore,
}

impl ReceiptInstaller {
    pub fn new(receipts: FsReceiptStore) -> Self {
        Self { receipts }
    }
}

#[async_trait]
impl Installer for ReceiptInstaller {
    async fn upgrade_to_latest(&self, manifest: &Manifest) -> Result<UpgradeStatus> {
        let mut receipt = self.receipts.load(&manifest.name).await.map_err(|e| {
            PlugctlError::Receipt(format!(
                "failed to load install receipt for plugin {:?}: {}",
                manifest.name, e
            ))
        })?;

        let current = parse_version(&receipt.version)?;
        let target = parse_version(&manifest.version)?;

        debug!(plugin = %manifest.name, current = %current, target = %target, "Comparing versions");
        if current >= target {
            debug!(plugin = %manifest.name, "Plugin does not need upgrade ({} >= {})", current, target);
            return Ok(UpgradeStatus::AlreadyCurrent);
        }

        let from = std::mem::replace(&mut receipt.version, manifest.version.clone());
        receipt.updated_at = Some(Utc::now());
        self.receipts.save(&receipt).await?;

        info!(plugin = %manifest.name, from = %from, to = %manifest.version, "Plugin upgraded");
        Ok(UpgradeStatus::Upgraded {
            from,
            to: manifest.version.clone(),
        })
    }
}
