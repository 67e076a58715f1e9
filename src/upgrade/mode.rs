//! Target-set resolution.
//!
//! Decides which plugins a run processes and how tolerant it is of
//! failures, based only on whether explicit names were given.

use tracing::debug;

use super::error::UpgradeError;
use super::traits::ReceiptStore;

/// Error-tolerance policy of a run.
///
/// Both flags are set together or cleared together; the constructors are
/// the only way to build a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeMode {
    ignore_already_upgraded: bool,
    tolerate_errors: bool,
}

impl UpgradeMode {
    /// Mode for "upgrade everything installed".
    pub const fn all_installed() -> Self {
        Self {
            ignore_already_upgraded: true,
            tolerate_errors: true,
        }
    }

    /// Mode for an explicit list of names.
    pub const fn explicit() -> Self {
        Self {
            ignore_already_upgraded: false,
            tolerate_errors: false,
        }
    }

    /// An already-current plugin is skipped instead of failing.
    pub fn ignore_already_upgraded(&self) -> bool {
        self.ignore_already_upgraded
    }

    /// Per-plugin failures are counted and skipped instead of aborting.
    pub fn tolerate_errors(&self) -> bool {
        self.tolerate_errors
    }
}

/// The names a run processes, in order, and the policy applied to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    pub names: Vec<String>,
    pub mode: UpgradeMode,
}

impl TargetSet {
    /// Targets for explicit `names`, kept verbatim.
    pub fn explicit(names: Vec<String>) -> Self {
        Self {
            names,
            mode: UpgradeMode::explicit(),
        }
    }
}

/// Resolve the target set for `args`.
///
/// Empty `args` selects every installed plugin (sorted by name) in
/// all-installed mode. Otherwise `args` are used as given, duplicates and
/// uninstalled names included.
pub async fn resolve_targets(
    args: &[String],
    receipts: &dyn ReceiptStore,
) -> Result<TargetSet, UpgradeError> {
    if !args.is_empty() {
        debug!(count = args.len(), "Upgrading explicitly named plugins");
        return Ok(TargetSet::explicit(args.to_vec()));
    }

    let installed = receipts
        .list_installed()
        .await
        .map_err(UpgradeError::ListInstalled)?;
    debug!(count = installed.len(), "Upgrading all installed plugins");

    Ok(TargetSet {
        names: installed.into_keys().collect(),
        mode: UpgradeMode::all_installed(),
    })
}
