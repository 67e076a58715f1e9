//! Git-backed refresh of the local plugin index.
//!
//! Wraps `git` subprocess calls via `tokio::process::Command`. The index
//! is cloned from the configured remote when no checkout exists, then
//! hard-reset to its upstream and cleaned of untracked files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PlugctlError, Result};
use crate::upgrade::IndexUpdater;

/// Keeps a git checkout of the plugin index up to date.
#[derive(Debug, Clone)]
pub struct GitIndexUpdater {
    /// Checkout directory.
    path: PathBuf,
    /// Remote to clone from when `path` is not a checkout yet.
    remote: Option<String>,
    /// Path to the git binary.
    git_path: String,
}

impl GitIndexUpdater {
    pub fn new(path: impl Into<PathBuf>, remote: Option<String>) -> Self {
        Self {
            path: path.into(),
            remote,
            git_path: "git".into(),
        }
    }

    /// Updater for the index described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.index_path(), config.index.remote.clone())
    }

    /// Use a specific git binary instead of `git` from `PATH`.
    pub fn with_git_path(mut self, git_path: impl Into<String>) -> Self {
        self.git_path = git_path.into();
        self
    }

    fn is_cloned(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Ensure the index is cloned.
    async fn ensure_cloned(&self) -> Result<()> {
        if self.is_cloned() {
            return Ok(());
        }

        let remote = self.remote.as_deref().ok_or_else(|| {
            PlugctlError::Git(format!(
                "index at {} is not a git checkout and no index remote is configured",
                self.path.display()
            ))
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(remote = %remote, path = %self.path.display(), "Cloning plugin index");
        let target = self.path.to_string_lossy().into_owned();
        self.run(None, &["clone", "-v", remote, target.as_str()]).await?;
        Ok(())
    }

    /// Fetch from upstream, reset to it and drop untracked files.
    async fn update_and_clean(&self) -> Result<()> {
        self.run(Some(&self.path), &["fetch", "-v"]).await?;
        self.run(Some(&self.path), &["reset", "--hard", "@{upstream}"])
            .await?;
        self.run(Some(&self.path), &["clean", "-xfd"]).await?;
        Ok(())
    }

    /// Run git with `args`, optionally inside `cwd`.
    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String> {
        debug!(git_path = %self.git_path, args = ?args, "Running git command");

        let mut cmd = Command::new(&self.git_path);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| PlugctlError::Git(format!("Failed to run git: {}", e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PlugctlError::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl IndexUpdater for GitIndexUpdater {
    async fn refresh(&self) -> Result<()> {
        self.ensure_cloned().await?;
        self.update_and_clean().await
    }
}
