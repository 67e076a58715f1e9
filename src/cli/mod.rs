//! Command-line interface for plugctl.

mod upgrade;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "plugctl")]
#[command(about = "Manage locally installed plugins against a local plugin index", long_about = None)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Upgrade installed plugins to newer versions
    #[command(long_about = "Upgrade installed plugins to a newer version.\n\
        This reinstalls every plugin that has a newer version in the local index.\n\
        To only upgrade some plugins, name them as arguments:\n  \
        plugctl upgrade foo bar")]
    Upgrade {
        /// Plugins to upgrade (default: all installed plugins)
        names: Vec<String>,

        /// Do not update the local copy of the plugin index before upgrading
        #[arg(long)]
        no_update_index: bool,
    },
    /// Show version information
    Version,
}

/// Log filter for the given `-v` count, used when `RUST_LOG` is unset.
pub(crate) fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "plugctl=warn",
        1 => "plugctl=info",
        2 => "plugctl=debug",
        _ => "plugctl=trace",
    }
}

pub(crate) async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Upgrade {
            names,
            no_update_index,
        }) => upgrade::cmd_upgrade(names, no_update_index).await,
        Some(Commands::Version) | None => {
            println!("plugctl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
