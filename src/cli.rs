use clap::Parser;

use crate::logging::Verbosity;

/// Regenerate the static redirect tree described by `./config.json`.
#[derive(Parser, Debug)]
#[command(
    name = "shortcuts",
    about = "Regenerate static redirect pages from config.json",
    version
)]
pub struct Cli {
    /// Only print warnings, errors, and the deletion prompt
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print per-shortcut progress
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Console verbosity selected by the flags.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
