//! Collaborator seams of the upgrade orchestrator.
//!
//! The orchestrator never touches the filesystem or the network itself.
//! Everything it reads or mutates goes through these traits, so the batch
//! logic can be exercised against in-memory fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::plugins::{InstalledReceipt, Manifest, UpgradeStatus};

/// Enumerates the installed-receipts store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// All installed plugins keyed by name.
    async fn list_installed(&self) -> Result<BTreeMap<String, InstalledReceipt>>;
}

/// Read access to the local plugin index.
#[async_trait]
pub trait PluginIndex: Send + Sync {
    /// Load the manifest for `name`. `Ok(None)` means the index has no
    /// such plugin; any `Err` is a lookup failure.
    async fn load_manifest(&self, name: &str) -> Result<Option<Manifest>>;
}

/// Installs the version described by a manifest.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Bring the installed plugin up to `manifest.version`.
    async fn upgrade_to_latest(&self, manifest: &Manifest) -> Result<UpgradeStatus>;
}

/// Best-effort notice printed after a plugin was upgraded.
pub trait SecurityNotifier: Send + Sync {
    fn notify(&self, name: &str);
}

/// Refreshes the local copy of the plugin index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexUpdater: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}
