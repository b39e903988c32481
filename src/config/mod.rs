//! Shortcut configuration: document types, loading, and validation.
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::logging::Log;

pub use validation::validate;

/// Default name of the configuration document inside the site directory.
pub const CONFIG_FILE: &str = "config.json";

/// A short path that redirects to a target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    /// Path below the target root, e.g. `/go/docs`.
    pub shortcut: String,
    /// Redirect destination.
    pub url: String,
    /// Display title used in the page and the listing.
    pub title: String,
}

impl Shortcut {
    /// Create a shortcut from its three fields.
    #[must_use]
    pub fn new(
        shortcut: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            shortcut: shortcut.into(),
            url: url.into(),
            title: title.into(),
        }
    }

    /// Non-empty path components, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.shortcut.split('/').filter(|s| !s.is_empty())
    }
}

/// A configuration document that passed every validation rule.
#[derive(Debug, Clone)]
pub struct ValidConfig {
    /// The parsed document exactly as read, extra fields included.
    pub document: Value,
    /// Target root, resolved and canonicalized.
    pub root: PathBuf,
    /// Page template location.
    pub template: PathBuf,
    /// Shortcuts in configuration order.
    pub shortcuts: Vec<Shortcut>,
}

/// Read the configuration document at `path` and validate it.
///
/// Relative paths inside the document resolve against `base`.
///
/// # Errors
///
/// Returns [`ConfigError::ConfigMissing`] if the file cannot be read, or the
/// first rule violation found by [`validate`].
pub fn load(path: &Path, base: &Path, log: &dyn Log) -> Result<ValidConfig, ConfigError> {
    log.stage(&format!("Loading configuration from {}", path.display()));
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ConfigMissing {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&raw, base, log)
}
