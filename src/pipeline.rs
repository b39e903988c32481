//! End-to-end build: validate, render, reconcile, record.
//!
//! ```text
//! [load version ∥ load + validate config]
//!   → read template
//!   → clear (confirmed) → build pages (parallel)
//!   → [record lastRun ∥ regenerate listing]
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::{self, CONFIG_FILE};
use crate::error::{BuildError, ConfigError, TemplateError};
use crate::logging::Log;
use crate::manifest::{self, LISTING_FILE};
use crate::prompt::Confirm;
use crate::render::{PageValues, render_page};
use crate::tree;
use crate::version::{self, VERSION_MANIFEST};

/// Locations of the files a run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    /// Directory relative configured paths resolve against.
    pub base: PathBuf,
    /// Configuration store, read and rewritten.
    pub config: PathBuf,
    /// Manifest carrying the site version.
    pub version_manifest: PathBuf,
    /// Generated listing document.
    pub listing: PathBuf,
}

impl SitePaths {
    /// Default file names inside the site directory `base`.
    #[must_use]
    pub fn in_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config: base.join(CONFIG_FILE),
            version_manifest: base.join(VERSION_MANIFEST),
            listing: base.join(LISTING_FILE),
            base,
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Site version substituted into pages.
    pub version: String,
    /// Target root that was rebuilt.
    pub root: PathBuf,
    /// Entries deleted by the clear phase.
    pub removed: Vec<PathBuf>,
    /// Pages written by the build phase.
    pub pages_written: usize,
    /// Timestamp stored as `data.lastRun`.
    pub finished_at: DateTime<Utc>,
}

fn read_template(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| {
        ConfigError::Template(TemplateError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Run one full build.
///
/// The configuration store is only rewritten after the output tree has been
/// rebuilt, so a rejected prompt leaves every file untouched.
///
/// # Errors
///
/// Returns the first failing stage's error. Configuration errors take
/// precedence over version errors when both loads fail.
pub fn run(
    paths: &SitePaths,
    prompt: &dyn Confirm,
    log: &dyn Log,
) -> Result<RunSummary, BuildError> {
    let (version, config) = rayon::join(
        || version::load(&paths.version_manifest),
        || config::load(&paths.config, &paths.base, log),
    );
    let config = config?;
    let version = version?;
    log.info(&format!("site version {version}"));

    log.stage("Loading template");
    let template = read_template(&config.template)?;

    let outcome = tree::reconcile(
        &config.root,
        &config.shortcuts,
        |shortcut| {
            render_page(
                &template,
                &PageValues {
                    url: &shortcut.url,
                    title: &shortcut.title,
                    version: &version,
                },
            )
        },
        prompt,
        log,
    )?;

    let finished_at = Utc::now();
    manifest::update(
        &paths.config,
        &paths.listing,
        &config,
        &version,
        finished_at,
        log,
    )?;

    Ok(RunSummary {
        version,
        root: config.root,
        removed: outcome.removed,
        pages_written: outcome.written,
        finished_at,
    })
}
