//! Error types for plugctl
//!
//! This module defines the error type shared by the local backends and the
//! collaborator traits. Uses `thiserror` for ergonomic error handling with
//! automatic `Display` and `Error` trait implementations.
//!
//! Fatal batch errors raised by the upgrade orchestrator live in
//! [`crate::upgrade::UpgradeError`] and wrap this type as their source.

use thiserror::Error;

/// The primary error type for plugctl operations.
#[derive(Error, Debug)]
pub enum PlugctlError {
    /// Configuration-related errors (unreadable config, bad env overrides, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index errors (malformed manifests, name mismatches, etc.)
    #[error("Index error: {0}")]
    Index(String),

    /// Install receipt errors (missing or malformed receipts)
    #[error("Receipt error: {0}")]
    Receipt(String),

    /// Version strings that are not valid semantic versions
    #[error("Version error: {0}")]
    Version(String),

    /// Failures of the git subprocess used to refresh the index
    #[error("Git error: {0}")]
    Git(String),

    /// Plugin names that could escape the index or receipts directory
    #[error("unsafe plugin name {0:?}")]
    UnsafeName(String),

    /// The requested plugin has no manifest in the local index
    #[error("plugin {0:?} does not exist in the plugin index")]
    NotInIndex(String),

    /// The installed version is already the newest one in the index
    #[error("can't upgrade, the newest version is already installed")]
    AlreadyUpgraded,

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for plugctl operations.
pub type Result<T> = std::result::Result<T, PlugctlError>;
