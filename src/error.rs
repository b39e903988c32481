//! Domain-specific error types for the shortcut site builder.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Each pipeline stage returns its own typed error while the binary converts
//! the top-level [`BuildError`] to [`anyhow::Error`] at the CLI boundary.
//!
//! # Error hierarchy
//!
//! ```text
//! BuildError
//! ├── Config(ConfigError)       — configuration loading and validation
//! ├── Version(VersionError)     — version manifest lookup
//! ├── Reconcile(ReconcileError) — clearing and rebuilding the output tree
//! └── Manifest(ManifestError)   — last-run record and listing document
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for one build run.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The configuration document is missing or violates a rule.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The version string could not be determined.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Clearing or rebuilding the output tree failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Writing the last-run record or the listing document failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Validation failures, one variant per configuration rule.
///
/// Validation is fail-fast: only the first violation is reported.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration `{}`: {source}", path.display())]
    ConfigMissing {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The document is not JSON or lacks a `configuration` object.
    #[error("`configuration` object missing or malformed: {reason}")]
    MalformedDocument {
        /// What was wrong with the document.
        reason: String,
    },

    /// `path` is missing, not a string, or not an allowed target root.
    #[error(
        "configured path {0} is invalid: it must be a string beginning with `..`, `~`, or `/` and must not be the root directory"
    )]
    InvalidPath(String),

    /// `path` does not name an existing directory.
    #[error("configured path `{0}` does not exist or is not a directory")]
    PathNotFound(String),

    /// `shortcuts` is missing or not an array.
    #[error("configured `shortcuts` array is missing or malformed")]
    MissingShortcuts,

    /// A shortcut entry violates the shortcut schema.
    #[error("shortcut #{index} {shortcut} {kind}")]
    Shortcut {
        /// 1-based position of the entry in `shortcuts`.
        index: usize,
        /// The entry as it appears in the document.
        shortcut: String,
        /// Which schema rule was violated.
        kind: ShortcutError,
    },

    /// `template` is missing or does not name a regular file.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Shortcut schema violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutError {
    /// The entry is not a JSON object.
    #[error("is not an object")]
    NotObject,

    /// One of `shortcut`, `url`, `title` is absent.
    #[error("does not include all required keys `shortcut`, `url`, and `title`")]
    MissingKeys,

    /// One of the required keys holds a non-string value.
    #[error("has a non-string value; `shortcut`, `url`, and `title` must be strings")]
    FieldType,

    /// The `shortcut` path is not an acceptable tree path.
    #[error(
        "has an invalid path: it must start with `/`, must not contain `//`, `.` or `..` segments, and must be a valid URI"
    )]
    InvalidPath,
}

/// Template location failures.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// `template` is missing or not a string.
    #[error("`template` is missing or malformed")]
    Invalid,

    /// The template path does not exist.
    #[error("template `{0}` does not exist")]
    NotFound(String),

    /// The template path exists but is not a regular file.
    #[error("template `{0}` is not a file")]
    NotFile(String),

    /// The template file exists but could not be read.
    #[error("could not read template `{}`: {source}", path.display())]
    Unreadable {
        /// Location of the template.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Failures reading the version from the package manifest.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The manifest could not be read.
    #[error("could not read version manifest `{}`: {source}", path.display())]
    Unreadable {
        /// Location of the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("version manifest `{}` is malformed: {source}", path.display())]
    Malformed {
        /// Location of the manifest.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The manifest has no string `version` field.
    #[error("`version` must be set in `{}`", .0.display())]
    MissingVersion(PathBuf),
}

/// Failures while clearing or rebuilding the output tree.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The operator declined the deletion prompt.
    #[error("user rejected deletion")]
    UserRejectedDeletion,

    /// The confirmation prompt itself failed.
    #[error("confirmation prompt failed: {0}")]
    Prompt(#[source] io::Error),

    /// A filesystem operation failed.
    #[error("failed to {action} `{}`: {source}", path.display())]
    Io {
        /// Short description of the operation (e.g. "remove").
        action: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl ReconcileError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failures while persisting run bookkeeping.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The configuration document could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A bookkeeping file could not be written.
    #[error("failed to write `{}`: {source}", path.display())]
    Io {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
