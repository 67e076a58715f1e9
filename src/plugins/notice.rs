//! Security notice shown after a plugin upgrade.

use crate::upgrade::SecurityNotifier;

/// Name under which plugctl itself may appear in the index.
pub const SELF_PLUGIN_NAME: &str = "plugctl";

/// Render the notice for `plugin`, or `None` for plugctl itself.
pub fn security_notice(plugin: &str) -> Option<String> {
    if plugin == SELF_PLUGIN_NAME {
        return None;
    }
    Some(format!(
        "You installed plugin {:?} from the plugin index.\n   \
         Plugins in the index are not audited for security.\n   \
         Run them at your own risk.",
        plugin
    ))
}

/// Prints [`security_notice`] to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSecurityNotice;

impl SecurityNotifier for StderrSecurityNotice {
    fn notify(&self, name: &str) {
        if let Some(notice) = security_notice(name) {
            eprintln!("{}", notice);
        }
    }
}
