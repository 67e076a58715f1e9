//! Utility modules for plugctl.

pub mod git;

pub use git::GitIndexUpdater;
