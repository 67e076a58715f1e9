//! Upgrade command handler.

use anyhow::{Context, Result};
use tracing::debug;

use plugctl::config::Config;
use plugctl::upgrade::{Reporter, UpgradeOptions, Upgrader};

/// Build the run options from the parsed flags and the loaded config.
///
/// The index refresh is skipped when the flag is given or when the config
/// turns automatic index updates off.
pub(crate) fn upgrade_options(
    names: Vec<String>,
    no_update_index: bool,
    config: &Config,
) -> UpgradeOptions {
    UpgradeOptions {
        names,
        no_update_index: no_update_index || !config.index.auto_update,
    }
}

/// Upgrade all installed plugins, or only `names` when given.
pub(crate) async fn cmd_upgrade(names: Vec<String>, no_update_index: bool) -> Result<()> {
    let config = Config::load().with_context(|| "Failed to load configuration")?;
    debug!(root = %config.root().display(), "Loaded configuration");

    let options = upgrade_options(names, no_update_index, &config);
    let upgrader = Upgrader::from_config(&config);
    upgrader.run(&options, &mut Reporter::stderr()).await?;
    Ok(())
}
