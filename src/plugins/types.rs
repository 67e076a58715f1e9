//! Plugin types for plugctl
//!
//! This module defines the records exchanged between the upgrade
//! orchestrator and its collaborators: the index [`Manifest`], the
//! [`InstalledReceipt`] kept by the installation store, and the
//! [`UpgradeStatus`] returned by an upgrade attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlugctlError, Result};

/// The latest known definition of a plugin, read from the local index.
///
/// # Example
///
/// ```json
/// {
///   "name": "tree",
///   "version": "v0.4.1",
///   "homepage": "https://example.com/tree",
///   "short_description": "Show a hierarchy of resources"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Plugin name. Must match the manifest's file name in the index.
    pub name: String,

    /// Semantic version string, optionally prefixed with `v`.
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// One-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Manifest {
    /// Create a manifest with only the required fields set.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            homepage: None,
            short_description: None,
            description: None,
        }
    }
}

/// Record of an installed plugin, owned by the receipts store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledReceipt {
    /// Plugin name.
    pub name: String,

    /// Installed version string.
    pub version: String,

    /// When the plugin was first installed.
    pub installed_at: DateTime<Utc>,

    /// When the plugin was last upgraded, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InstalledReceipt {
    /// Create a receipt for a fresh install happening now.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            installed_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Successful result of an upgrade-to-latest request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeStatus {
    /// A newer version was installed.
    Upgraded { from: String, to: String },
    /// The installed version is already the newest one.
    AlreadyCurrent,
}

/// Parse a plugin version, accepting an optional leading `v`.
pub fn parse_version(raw: &str) -> Result<semver::Version> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(bare)
        .map_err(|e| PlugctlError::Version(format!("{:?} is not a semantic version: {}", raw, e)))
}
