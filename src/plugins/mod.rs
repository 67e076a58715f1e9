//! Local plugin backends for plugctl
//!
//! This module provides the filesystem implementations of the upgrade
//! orchestrator's collaborators, plus the records they exchange.
//!
//! # Architecture
//!
//! - **types**: Core records (`Manifest`, `InstalledReceipt`, `UpgradeStatus`)
//! - **index**: Manifest lookup and name validation (`FsPluginIndex`)
//! - **receipts**: Install receipt enumeration and persistence (`FsReceiptStore`)
//! - **installer**: Version comparison and receipt rewrite (`ReceiptInstaller`)
//! - **notice**: Post-upgrade security notice (`StderrSecurityNotice`)
//!
//! # Example manifest (`index/plugins/tree.json`)
//!
//! ```json
//! {
//!   "name": "tree",
//!   "version": "v0.4.1",
//!   "short_description": "Show a hierarchy of resources"
//! }
//! ```
//!
//! # Example receipt (`receipts/tree.json`)
//!
//! ```json
//! {
//!   "name": "tree",
//!   "version": "v0.4.0",
//!   "installed_at": "2026-01-05T10:12:00Z"
//! }
//! ```

pub mod index;
pub mod installer;
pub mod notice;
pub mod receipts;
pub mod types;

pub use index::{is_safe_plugin_name, validate_manifest, FsPluginIndex};
pub use installer::ReceiptInstaller;
pub use notice::{security_notice, StderrSecurityNotice, SELF_PLUGIN_NAME};
pub use receipts::FsReceiptStore;
pub use types::{parse_version, InstalledReceipt, Manifest, UpgradeStatus};
