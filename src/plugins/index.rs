//! Manifest lookup in the local plugin index
//!
//! The index is a directory with one `<name>.json` manifest per plugin.
//! Lookups validate the requested name before touching the filesystem,
//! so a name can never resolve outside the index directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{PlugctlError, Result};
use crate::upgrade::PluginIndex;

use super::types::{parse_version, Manifest};

static SAFE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._\-]{0,63}$").expect("valid name regex"));

/// Whether `name` is usable as a single path component in the index
/// and receipts directories.
pub fn is_safe_plugin_name(name: &str) -> bool {
    SAFE_NAME_RE.is_match(name)
}

/// Reject names that are not safe path components.
pub fn ensure_safe_plugin_name(name: &str) -> Result<()> {
    if is_safe_plugin_name(name) {
        Ok(())
    } else {
        Err(PlugctlError::UnsafeName(name.to_string()))
    }
}

/// Validate a manifest read from `<name>.json`.
///
/// The manifest must name the plugin it was looked up for, and its
/// version must be a semantic version.
pub fn validate_manifest(name: &str, manifest: &Manifest) -> Result<()> {
    if manifest.name != name {
        return Err(PlugctlError::Index(format!(
            "manifest for {:?} declares a different plugin name {:?}",
            name, manifest.name
        )));
    }

    parse_version(&manifest.version).map_err(|e| {
        PlugctlError::Index(format!("plugin {:?} has an invalid version: {}", name, e))
    })?;

    Ok(())
}

/// Plugin index backed by a directory of JSON manifests.
#[derive(Debug, Clone)]
pub struct FsPluginIndex {
    plugins_dir: PathBuf,
}

impl FsPluginIndex {
    /// Create an index reading manifests from `plugins_dir`.
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
        }
    }

    /// The directory manifests are read from.
    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    fn manifest_path(&self, name: &str) -> PathBuf {
        self.plugins_dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl PluginIndex for FsPluginIndex {
    async fn load_manifest(&self, name: &str) -> Result<Option<Manifest>> {
        ensure_safe_plugin_name(name)?;

        let path = self.manifest_path(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(plugin = %name, path = %path.display(), "No manifest in index");
                return Ok(None);
            }
            Err(e) => {
                return Err(PlugctlError::Index(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let manifest: Manifest = serde_json::from_str(&content).map_err(|e| {
            PlugctlError::Index(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        validate_manifest(name, &manifest)?;

        debug!(plugin = %name, version = %manifest.version, "Loaded manifest");
        Ok(Some(manifest))
    }
}
