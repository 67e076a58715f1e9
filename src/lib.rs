//! plugctl - batch upgrades for locally installed plugins

pub mod config;
pub mod error;
pub mod plugins;
pub mod upgrade;
pub mod utils;

pub use config::Config;
pub use error::{PlugctlError, Result};
pub use upgrade::{UpgradeError, UpgradeOptions, Upgrader};
