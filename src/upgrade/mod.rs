//! Batch upgrade orchestration for plugctl
//!
//! Upgrades either every installed plugin or an explicit list of names,
//! one plugin at a time and in order, classifying each result as upgraded,
//! already current, missing or failed.
//!
//! # Architecture
//!
//! - **traits**: Collaborator seams (`ReceiptStore`, `PluginIndex`, `Installer`,
//!   `SecurityNotifier`, `IndexUpdater`)
//! - **mode**: Target-set resolution and the error-tolerance policy
//! - **outcome**: Pure classification of lookup and upgrade results
//! - **report**: Progress and summary lines on the diagnostic stream
//! - **error**: Fatal errors that abort a run
//!
//! # Policies
//!
//! | Condition        | No names given           | Explicit names |
//! |------------------|--------------------------|----------------|
//! | Not in index     | warn, count, continue    | abort          |
//! | Already current  | skip silently            | abort          |
//! | Upgrade failure  | warn, count, continue    | abort          |
//! | Lookup I/O error | abort                    | abort          |
//!
//! # Usage
//!
//! ```rust,no_run
//! use plugctl::config::Config;
//! use plugctl::upgrade::{Reporter, UpgradeOptions, Upgrader};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let upgrader = Upgrader::from_config(&config);
//! let options = UpgradeOptions::all().skip_index_update(true);
//! let result = upgrader.run(&options, &mut Reporter::stderr()).await?;
//! println!("{} upgraded", result.upgraded.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod mode;
mod outcome;
mod report;
mod traits;

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::plugins::{FsPluginIndex, FsReceiptStore, ReceiptInstaller, StderrSecurityNotice};
use crate::utils::GitIndexUpdater;

pub use error::UpgradeError;
pub use mode::{resolve_targets, TargetSet, UpgradeMode};
pub use outcome::{classify_lookup, classify_upgrade, Lookup, Outcome};
pub use report::{Reporter, FAILURE_SUMMARY};
pub use traits::{IndexUpdater, Installer, PluginIndex, ReceiptStore, SecurityNotifier};

/// Options of one upgrade invocation, populated before the run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Plugins to upgrade. Empty means every installed plugin.
    pub names: Vec<String>,
    /// Skip the pre-flight refresh of the local index.
    pub no_update_index: bool,
}

impl UpgradeOptions {
    /// Upgrade every installed plugin.
    pub fn all() -> Self {
        Self::default()
    }

    /// Upgrade exactly `names`, in the given order.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            no_update_index: false,
        }
    }

    pub fn skip_index_update(mut self, skip: bool) -> Self {
        self.no_update_index = skip;
        self
    }
}

/// Names processed by a run that completed without a fatal error,
/// grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub upgraded: Vec<String>,
    pub already_current: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchResult {
    /// Number of tolerated failures (missing and failed plugins).
    pub fn failure_count(&self) -> usize {
        self.missing.len() + self.failed.len()
    }

    /// Number of plugins processed.
    pub fn processed(&self) -> usize {
        self.upgraded.len() + self.already_current.len() + self.failure_count()
    }

    fn record(&mut self, name: &str, outcome: &Outcome) {
        let bucket = match outcome {
            Outcome::Upgraded => &mut self.upgraded,
            Outcome::AlreadySkipped => &mut self.already_current,
            Outcome::MissingSkipped(_) => &mut self.missing,
            Outcome::Failed(_) => &mut self.failed,
        };
        bucket.push(name.to_string());
    }
}

/// Runs batch upgrades against a set of collaborators.
pub struct Upgrader {
    receipts: Arc<dyn ReceiptStore>,
    index: Arc<dyn PluginIndex>,
    installer: Arc<dyn Installer>,
    notifier: Arc<dyn SecurityNotifier>,
    updater: Arc<dyn IndexUpdater>,
}

impl Upgrader {
    pub fn new(
        receipts: Arc<dyn ReceiptStore>,
        index: Arc<dyn PluginIndex>,
        installer: Arc<dyn Installer>,
        notifier: Arc<dyn SecurityNotifier>,
        updater: Arc<dyn IndexUpdater>,
    ) -> Self {
        Self {
            receipts,
            index,
            installer,
            notifier,
            updater,
        }
    }

    /// Upgrader using the filesystem and git backends rooted at `config`.
    pub fn from_config(config: &Config) -> Self {
        let receipts = FsReceiptStore::new(config.install_receipts_path());
        Self::new(
            Arc::new(receipts.clone()),
            Arc::new(FsPluginIndex::new(config.index_plugins_path())),
            Arc::new(ReceiptInstaller::new(receipts)),
            Arc::new(StderrSecurityNotice),
            Arc::new(GitIndexUpdater::from_config(config)),
        )
    }

    /// Refresh the index, resolve targets and upgrade them in order.
    ///
    /// Returns the grouped outcomes of a run that never hit a fatal
    /// condition, even if some plugins failed along the way. Upgrades
    /// completed before a fatal error are not rolled back.
    pub async fn run<W: Write>(
        &self,
        options: &UpgradeOptions,
        reporter: &mut Reporter<W>,
    ) -> Result<BatchResult, UpgradeError> {
        self.preflight(options, reporter).await?;
        let targets = resolve_targets(&options.names, self.receipts.as_ref()).await?;
        self.run_batch(&targets, reporter).await
    }

    async fn preflight<W: Write>(
        &self,
        options: &UpgradeOptions,
        reporter: &mut Reporter<W>,
    ) -> Result<(), UpgradeError> {
        if options.no_update_index {
            debug!("--no-update-index specified, skipping updating local copy of plugin index");
            return Ok(());
        }

        info!("Updating the local copy of plugin index");
        self.updater
            .refresh()
            .await
            .map_err(UpgradeError::RefreshIndex)?;
        reporter.index_updated();
        Ok(())
    }

    /// Process `targets` in order, stopping at the first fatal condition.
    pub async fn run_batch<W: Write>(
        &self,
        targets: &TargetSet,
        reporter: &mut Reporter<W>,
    ) -> Result<BatchResult, UpgradeError> {
        let mode = targets.mode;
        let mut result = BatchResult::default();

        for name in &targets.names {
            let lookup = self.index.load_manifest(name).await;
            let manifest = match classify_lookup(name, lookup, mode)? {
                Lookup::Found(manifest) => manifest,
                Lookup::Skip(outcome) => {
                    debug!(plugin = %name, "Plugin not found in index, skipping");
                    reporter.outcome(name, &outcome);
                    result.record(name, &outcome);
                    continue;
                }
            };

            reporter.upgrading(name);
            let status = self.installer.upgrade_to_latest(&manifest).await;
            let outcome = classify_upgrade(name, status, mode)?;

            if let Some(err) = outcome.error() {
                debug!(plugin = %name, error = %err, "Upgrade failed, skipping");
            }
            reporter.outcome(name, &outcome);
            if matches!(outcome, Outcome::Upgraded) {
                self.notifier.notify(&manifest.name);
            }
            result.record(name, &outcome);
        }

        reporter.summary(result.failure_count());
        info!(
            upgraded = result.upgraded.len(),
            already_current = result.already_current.len(),
            failed = result.failure_count(),
            "Upgrade run finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlugctlError, Result};
    use crate::plugins::{InstalledReceipt, Manifest, UpgradeStatus};
    use crate::upgrade::report::testing::{capture_logs, SharedBuf};
    use crate::upgrade::traits::{MockIndexUpdater, MockReceiptStore};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Mutex;

    // ---------------------------------------------------------------
    // Fakes
    // ---------------------------------------------------------------

    #[derive(Default)]
    struct FakeReceipts {
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl ReceiptStore for FakeReceipts {
        async fn list_installed(&self) -> Result<BTreeMap<String, InstalledReceipt>> {
            Ok(self
                .names
                .iter()
                .map(|n| (n.to_string(), InstalledReceipt::new(*n, "v1.0.0")))
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeIndex {
        known: HashSet<&'static str>,
        broken: HashSet<&'static str>,
        lookups: Mutex<Vec<String>>,
    }

    impl FakeIndex {
        fn with(known: &[&'static str]) -> Self {
            Self {
                known: known.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PluginIndex for FakeIndex {
        async fn load_manifest(&self, name: &str) -> Result<Option<Manifest>> {
            self.lookups.lock().unwrap().push(name.to_string());
            if self.broken.contains(name) {
                return Err(PlugctlError::Index(format!("unreadable manifest {}", name)));
            }
            Ok(self
                .known
                .contains(name)
                .then(|| Manifest::new(name, "v2.0.0")))
        }
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Upgrade,
        Current,
        Fail,
    }

    #[derive(Default)]
    struct FakeInstaller {
        behaviour: HashMap<&'static str, Behaviour>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeInstaller {
        fn with(behaviour: &[(&'static str, Behaviour)]) -> Self {
            Self {
                behaviour: behaviour.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Installer for FakeInstaller {
        async fn upgrade_to_latest(&self, manifest: &Manifest) -> Result<UpgradeStatus> {
            self.calls.lock().unwrap().push(manifest.name.clone());
            match self
                .behaviour
                .get(manifest.name.as_str())
                .copied()
                .unwrap_or(Behaviour::Upgrade)
            {
                Behaviour::Upgrade => Ok(UpgradeStatus::Upgraded {
                    from: "v1.0.0".into(),
                    to: manifest.version.clone(),
                }),
                Behaviour::Current => Ok(UpgradeStatus::AlreadyCurrent),
                Behaviour::Fail => Err(PlugctlError::Receipt("permission denied".into())),
            }
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        notified: Mutex<Vec<String>>,
        log: Option<SharedBuf>,
    }

    impl FakeNotifier {
        /// Notifier that also records `notify(<name>)` into `log`.
        fn logging(log: SharedBuf) -> Self {
            Self {
                log: Some(log),
                ..Default::default()
            }
        }

        fn notified(&self) -> Vec<String> {
            self.notified.lock().unwrap().clone()
        }
    }

    impl SecurityNotifier for FakeNotifier {
        fn notify(&self, name: &str) {
            self.notified.lock().unwrap().push(name.to_string());
            if let Some(log) = &self.log {
                log.push_line(&format!("notify({})", name));
            }
        }
    }

    fn idle_updater() -> MockIndexUpdater {
        let mut updater = MockIndexUpdater::new();
        updater.expect_refresh().times(0);
        updater
    }

    struct Harness {
        index: Arc<FakeIndex>,
        installer: Arc<FakeInstaller>,
        notifier: Arc<FakeNotifier>,
        upgrader: Upgrader,
    }

    fn harness(installed: &[&'static str], index: FakeIndex, installer: FakeInstaller) -> Harness {
        harness_with(installed, index, installer, FakeNotifier::default())
    }

    fn harness_with(
        installed: &[&'static str],
        index: FakeIndex,
        installer: FakeInstaller,
        notifier: FakeNotifier,
    ) -> Harness {
        let index = Arc::new(index);
        let installer = Arc::new(installer);
        let notifier = Arc::new(notifier);
        let upgrader = Upgrader::new(
            Arc::new(FakeReceipts {
                names: installed.to_vec(),
            }),
            index.clone(),
            installer.clone(),
            notifier.clone(),
            Arc::new(idle_updater()),
        );
        Harness {
            index,
            installer,
            notifier,
            upgrader,
        }
    }

    async fn run(
        h: &Harness,
        options: UpgradeOptions,
    ) -> (std::result::Result<BatchResult, UpgradeError>, String) {
        let mut reporter = Reporter::new(Vec::new());
        let result = h
            .upgrader
            .run(&options.skip_index_update(true), &mut reporter)
            .await;
        (result, String::from_utf8(reporter.into_inner()).unwrap())
    }

    // ---------------------------------------------------------------
    // Scenarios
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_nothing_installed_prints_nothing() {
        let h = harness(&[], FakeIndex::default(), FakeInstaller::default());

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        let result = result.unwrap();
        assert_eq!(result.processed(), 0);
        assert_eq!(out, "");
        assert!(h.index.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_missing_plugin_is_fatal() {
        let h = harness(&[], FakeIndex::default(), FakeInstaller::default());

        let (result, out) = run(&h, UpgradeOptions::named(["foo"])).await;
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "plugin \"foo\" does not exist in the plugin index"
        );
        assert_eq!(out, "");
        assert!(h.installer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_mode_skips_already_current() {
        let h = harness(
            &["bar"],
            FakeIndex::with(&["bar"]),
            FakeInstaller::with(&[("bar", Behaviour::Current)]),
        );

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        let result = result.unwrap();
        assert_eq!(
            out,
            "Upgrading plugin: bar\nSkipping plugin bar, it is already on the newest version\n"
        );
        assert_eq!(result.failure_count(), 0);
        assert_eq!(result.already_current, vec!["bar"]);
        assert!(h.notifier.notified().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_success_then_missing_aborts_without_undo() {
        let h = harness(&[], FakeIndex::with(&["foo"]), FakeInstaller::default());

        let (result, out) = run(&h, UpgradeOptions::named(["foo", "bar"])).await;
        let err = result.unwrap_err();
        assert!(matches!(err, UpgradeError::NotInIndex { ref name } if name == "bar"));
        assert_eq!(out, "Upgrading plugin: foo\nUpgraded plugin: foo\n");
        assert_eq!(h.notifier.notified(), vec!["foo"]);
        assert_eq!(h.installer.calls(), vec!["foo"]);
    }

    #[tokio::test]
    async fn test_all_mode_failure_is_tolerated_and_summarised() {
        let h = harness(
            &["a", "b"],
            FakeIndex::with(&["a", "b"]),
            FakeInstaller::with(&[("a", Behaviour::Fail)]),
        );

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        let result = result.unwrap();
        assert_eq!(
            out,
            concat!(
                "Upgrading plugin: a\n",
                "WARNING: failed to upgrade plugin \"a\", skipping (error: Receipt error: permission denied)\n",
                "Upgrading plugin: b\n",
                "Upgraded plugin: b\n",
                "WARNING: Some plugins failed to upgrade, check logs above.\n",
            )
        );
        assert_eq!(result.failed, vec!["a"]);
        assert_eq!(result.upgraded, vec!["b"]);
        assert_eq!(h.notifier.notified(), vec!["b"]);
    }

    // ---------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_all_mode_counts_each_missing_and_failed_once() {
        let h = harness(
            &["a", "b", "c", "d"],
            FakeIndex::with(&["a", "c", "d"]),
            FakeInstaller::with(&[("a", Behaviour::Fail), ("d", Behaviour::Current)]),
        );

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        let result = result.unwrap();
        assert_eq!(result.failure_count(), 2);
        assert_eq!(result.missing, vec!["b"]);
        assert_eq!(result.failed, vec!["a"]);
        assert_eq!(result.upgraded, vec!["c"]);
        assert_eq!(result.already_current, vec!["d"]);
        assert_eq!(h.index.lookups(), vec!["a", "b", "c", "d"]);
        assert!(!out.contains("Upgrading plugin: b"));
        assert!(out.contains("skipping (error: plugin \"b\" does not exist in the plugin index)"));
        assert_eq!(out.matches(FAILURE_SUMMARY).count(), 1);
    }

    #[tokio::test]
    async fn test_security_notice_follows_success_line_only() {
        let log = SharedBuf::default();
        let h = harness_with(
            &["a", "b", "c"],
            FakeIndex::with(&["a", "b", "c"]),
            FakeInstaller::with(&[("a", Behaviour::Fail), ("c", Behaviour::Current)]),
            FakeNotifier::logging(log.clone()),
        );

        let mut reporter = Reporter::new(log.clone());
        h.upgrader
            .run(&UpgradeOptions::all().skip_index_update(true), &mut reporter)
            .await
            .unwrap();

        let out = log.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Upgrading plugin: a",
                "WARNING: failed to upgrade plugin \"a\", skipping (error: Receipt error: permission denied)",
                "Upgrading plugin: b",
                "Upgraded plugin: b",
                "notify(b)",
                "Upgrading plugin: c",
                "Skipping plugin c, it is already on the newest version",
                FAILURE_SUMMARY,
            ]
        );
        assert_eq!(h.notifier.notified(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_tolerated_failures_are_not_logged_at_default_level() {
        let (logs, _guard) = capture_logs("plugctl=warn");
        let h = harness(
            &["a", "b", "c"],
            FakeIndex::with(&["a", "c"]),
            FakeInstaller::with(&[("a", Behaviour::Fail)]),
        );

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        assert_eq!(result.unwrap().failure_count(), 2);
        assert_eq!(out.matches("WARNING: failed to upgrade plugin").count(), 2);
        assert_eq!(logs.contents(), "");
    }

    #[tokio::test]
    async fn test_explicit_already_current_is_fatal() {
        let h = harness(
            &[],
            FakeIndex::with(&["bar", "baz"]),
            FakeInstaller::with(&[("bar", Behaviour::Current)]),
        );

        let (result, out) = run(&h, UpgradeOptions::named(["bar", "baz"])).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            UpgradeError::Upgrade { ref name, source: PlugctlError::AlreadyUpgraded } if name == "bar"
        ));
        assert_eq!(h.index.lookups(), vec!["bar"]);
        assert!(!out.contains("Skipping plugin"));
        assert!(!out.contains(FAILURE_SUMMARY));
    }

    #[tokio::test]
    async fn test_explicit_failure_halts_before_later_names() {
        let h = harness(
            &[],
            FakeIndex::with(&["a", "b"]),
            FakeInstaller::with(&[("a", Behaviour::Fail)]),
        );

        let (result, out) = run(&h, UpgradeOptions::named(["a", "b"])).await;
        let err = result.unwrap_err();
        assert_eq!(err.plugin(), Some("a"));
        assert_eq!(h.installer.calls(), vec!["a"]);
        assert_eq!(out, "Upgrading plugin: a\n");
    }

    #[tokio::test]
    async fn test_lookup_error_is_fatal_even_when_tolerant() {
        let mut index = FakeIndex::with(&["a", "c"]);
        index.broken.insert("b");
        let h = harness(&["a", "b", "c"], index, FakeInstaller::default());

        let (result, out) = run(&h, UpgradeOptions::all()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, UpgradeError::LoadManifest { ref name, .. } if name == "b"));
        assert_eq!(h.installer.calls(), vec!["a"]);
        assert!(!out.contains(FAILURE_SUMMARY));
    }

    #[tokio::test]
    async fn test_explicit_names_keep_caller_order_and_duplicates() {
        let h = harness(&[], FakeIndex::with(&["z", "a"]), FakeInstaller::default());

        let (result, _) = run(&h, UpgradeOptions::named(["z", "a", "z"])).await;
        let result = result.unwrap();
        assert_eq!(result.upgraded, vec!["z", "a", "z"]);
        assert_eq!(h.notifier.notified(), vec!["z", "a", "z"]);
    }

    #[tokio::test]
    async fn test_no_summary_when_everything_succeeds() {
        let h = harness(&["a"], FakeIndex::with(&["a"]), FakeInstaller::default());
        let (result, out) = run(&h, UpgradeOptions::all()).await;
        assert_eq!(result.unwrap().failure_count(), 0);
        assert!(!out.contains(FAILURE_SUMMARY));
    }

    // ---------------------------------------------------------------
    // Pre-flight
    // ---------------------------------------------------------------

    fn preflight_upgrader(updater: MockIndexUpdater, receipts: MockReceiptStore) -> Upgrader {
        Upgrader::new(
            Arc::new(receipts),
            Arc::new(FakeIndex::default()),
            Arc::new(FakeInstaller::default()),
            Arc::new(FakeNotifier::default()),
            Arc::new(updater),
        )
    }

    #[tokio::test]
    async fn test_refresh_runs_before_resolution() {
        let mut updater = MockIndexUpdater::new();
        updater.expect_refresh().times(1).returning(|| Ok(()));
        let mut receipts = MockReceiptStore::new();
        receipts
            .expect_list_installed()
            .times(1)
            .returning(|| Ok(BTreeMap::new()));

        let upgrader = preflight_upgrader(updater, receipts);
        let mut reporter = Reporter::new(Vec::new());
        upgrader
            .run(&UpgradeOptions::all(), &mut reporter)
            .await
            .unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "Updated the local copy of plugin index.\n");
    }

    #[tokio::test]
    async fn test_refresh_failure_aborts_before_any_plugin() {
        let mut updater = MockIndexUpdater::new();
        updater
            .expect_refresh()
            .times(1)
            .returning(|| Err(PlugctlError::Git("network unreachable".into())));
        let mut receipts = MockReceiptStore::new();
        receipts.expect_list_installed().times(0);

        let upgrader = preflight_upgrader(updater, receipts);
        let mut reporter = Reporter::new(Vec::new());
        let err = upgrader
            .run(&UpgradeOptions::all(), &mut reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, UpgradeError::RefreshIndex(_)));
        assert!(reporter.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_no_update_index_skips_refresh() {
        let mut receipts = MockReceiptStore::new();
        receipts
            .expect_list_installed()
            .times(1)
            .returning(|| Ok(BTreeMap::new()));

        let upgrader = preflight_upgrader(idle_updater(), receipts);
        let mut reporter = Reporter::new(Vec::new());
        upgrader
            .run(&UpgradeOptions::all().skip_index_update(true), &mut reporter)
            .await
            .unwrap();
        assert!(reporter.into_inner().is_empty());
    }

    #[test]
    fn test_options_constructors() {
        assert_eq!(UpgradeOptions::all(), UpgradeOptions::default());
        let named = UpgradeOptions::named(["a", "b"]).skip_index_update(true);
        assert_eq!(named.names, vec!["a".to_string(), "b".to_string()]);
        assert!(named.no_update_index);
    }
}
