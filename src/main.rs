use anyhow::Result;
use clap::Parser;

use shortcuts_cli::cli::Cli;
use shortcuts_cli::logging::{self, Log as _, Logger};
use shortcuts_cli::pipeline::{self, SitePaths};
use shortcuts_cli::prompt::StdinPrompt;

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbosity());
    let log = Logger::new();

    let summary = pipeline::run(&SitePaths::in_dir("."), &StdinPrompt, &log)?;

    log.stage("Done");
    log.info(&format!(
        "{} page(s) written to {} (version {}, {} removed, {} warning(s))",
        summary.pages_written,
        summary.root.display(),
        summary.version,
        summary.removed.len(),
        log.warning_count(),
    ));
    Ok(())
}
