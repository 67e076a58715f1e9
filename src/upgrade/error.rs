//! Fatal errors of an upgrade run.

use thiserror::Error;

use crate::error::PlugctlError;

/// An error that aborts the whole upgrade batch.
///
/// Tolerated per-plugin failures never surface as this type; they are
/// reported and counted instead.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// The pre-flight index refresh failed.
    #[error("failed to update the local index")]
    RefreshIndex(#[source] PlugctlError),

    /// The installed receipts could not be enumerated.
    #[error("failed to find all installed versions")]
    ListInstalled(#[source] PlugctlError),

    /// Looking up a manifest failed for a reason other than absence.
    #[error("failed to load the plugin manifest for plugin {name}")]
    LoadManifest {
        name: String,
        #[source]
        source: PlugctlError,
    },

    /// An explicitly requested plugin has no manifest in the index.
    #[error("plugin {name:?} does not exist in the plugin index")]
    NotInIndex { name: String },

    /// Upgrading an explicitly requested plugin failed.
    #[error("failed to upgrade plugin {name:?}")]
    Upgrade {
        name: String,
        #[source]
        source: PlugctlError,
    },
}

impl UpgradeError {
    /// The plugin the batch aborted on, if the failure was plugin-specific.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            UpgradeError::RefreshIndex(_) | UpgradeError::ListInstalled(_) => None,
            UpgradeError::LoadManifest { name, .. }
            | UpgradeError::NotInIndex { name }
            | UpgradeError::Upgrade { name, .. } => Some(name),
        }
    }
}
