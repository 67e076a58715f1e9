//! Human-readable progress lines for an upgrade run.
//!
//! The reporter writes to a diagnostic stream (stderr in the binary) and
//! mirrors every line as a trace event. Write failures are ignored: the
//! reporter never changes the course of a run.

use std::io::{self, Write};

use tracing::trace;

use super::outcome::Outcome;

/// Summary printed when a completed run had tolerated failures.
pub const FAILURE_SUMMARY: &str = "WARNING: Some plugins failed to upgrade, check logs above.";

/// Writes upgrade progress to a diagnostic stream.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stderr> {
    /// Reporter writing to stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the reporter, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// The local index copy was refreshed.
    pub fn index_updated(&mut self) {
        self.line("Updated the local copy of plugin index.".to_string());
    }

    /// An upgrade attempt is starting for `name`.
    pub fn upgrading(&mut self, name: &str) {
        self.line(format!("Upgrading plugin: {}", name));
    }

    /// The outcome of processing `name`.
    pub fn outcome(&mut self, name: &str, outcome: &Outcome) {
        let line = match outcome {
            Outcome::Upgraded => format!("Upgraded plugin: {}", name),
            Outcome::AlreadySkipped => format!(
                "Skipping plugin {}, it is already on the newest version",
                name
            ),
            Outcome::MissingSkipped(err) | Outcome::Failed(err) => format!(
                "WARNING: failed to upgrade plugin {:?}, skipping (error: {})",
                name, err
            ),
        };
        self.line(line);
    }

    /// End-of-run summary; prints nothing when there were no failures.
    pub fn summary(&mut self, failures: usize) {
        if failures > 0 {
            self.line(FAILURE_SUMMARY.to_string());
        }
    }

    fn line(&mut self, line: String) {
        trace!(target: "plugctl::report", "{}", line);
        let _ = writeln!(self.out, "{}", line);
    }
}
