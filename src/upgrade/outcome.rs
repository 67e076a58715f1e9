//! Per-plugin outcome classification.
//!
//! Pure functions mapping a collaborator result and the run's mode to
//! either an outcome for the batch to record or a fatal error that ends
//! the batch.

use crate::error::{PlugctlError, Result};
use crate::plugins::{Manifest, UpgradeStatus};

use super::error::UpgradeError;
use super::mode::UpgradeMode;

/// What happened to one plugin in a run that kept going.
#[derive(Debug)]
pub enum Outcome {
    /// A newer version was installed.
    Upgraded,
    /// Already on the newest version; skipped without counting.
    AlreadySkipped,
    /// No manifest in the index; skipped and counted as a failure.
    MissingSkipped(PlugctlError),
    /// Upgrade failed; skipped and counted as a failure.
    Failed(PlugctlError),
}

impl Outcome {
    /// Whether this outcome counts towards the run's failure total.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::MissingSkipped(_) | Outcome::Failed(_))
    }

    /// The underlying error of a failed outcome.
    pub fn error(&self) -> Option<&PlugctlError> {
        match self {
            Outcome::MissingSkipped(err) | Outcome::Failed(err) => Some(err),
            Outcome::Upgraded | Outcome::AlreadySkipped => None,
        }
    }
}

/// Result of classifying a manifest lookup.
#[derive(Debug)]
pub enum Lookup {
    /// Continue to the upgrade step with this manifest.
    Found(Manifest),
    /// Record this outcome and move to the next plugin.
    Skip(Outcome),
}

/// Classify the manifest lookup for `name`.
///
/// A missing manifest is skipped when the mode tolerates errors and is
/// fatal otherwise. Any other lookup error is always fatal.
pub fn classify_lookup(
    name: &str,
    lookup: Result<Option<Manifest>>,
    mode: UpgradeMode,
) -> std::result::Result<Lookup, UpgradeError> {
    match lookup {
        Ok(Some(manifest)) => Ok(Lookup::Found(manifest)),
        Ok(None) if mode.tolerate_errors() => Ok(Lookup::Skip(Outcome::MissingSkipped(
            PlugctlError::NotInIndex(name.to_string()),
        ))),
        Ok(None) => Err(UpgradeError::NotInIndex {
            name: name.to_string(),
        }),
        Err(source) => Err(UpgradeError::LoadManifest {
            name: name.to_string(),
            source,
        }),
    }
}

/// Classify the upgrade attempt for `name`.
///
/// An already-current plugin is only benign when the mode ignores it;
/// otherwise it is handled exactly like any other upgrade failure.
pub fn classify_upgrade(
    name: &str,
    status: Result<UpgradeStatus>,
    mode: UpgradeMode,
) -> std::result::Result<Outcome, UpgradeError> {
    let err = match status {
        Ok(UpgradeStatus::Upgraded { .. }) => return Ok(Outcome::Upgraded),
        Ok(UpgradeStatus::AlreadyCurrent) if mode.ignore_already_upgraded() => {
            return Ok(Outcome::AlreadySkipped)
        }
        Ok(UpgradeStatus::AlreadyCurrent) => PlugctlError::AlreadyUpgraded,
        Err(err) => err,
    };

    if mode.tolerate_errors() {
        Ok(Outcome::Failed(err))
    } else {
        Err(UpgradeError::Upgrade {
            name: name.to_string(),
            source: err,
        })
    }
}
