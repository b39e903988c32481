//! Clear-then-rebuild reconciliation of the output tree.
//!
//! The clear phase deletes every immediate child of the target root except
//! [protected entries](is_protected), and only after the operator confirms
//! the exact list. The build phase then writes one `index.html` per shortcut
//! into a directory path mirroring the shortcut's segments. The two phases
//! never overlap.
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Shortcut;
use crate::error::ReconcileError;
use crate::logging::Log;
use crate::prompt::Confirm;

/// Top-level names the clear phase never touches, besides hidden entries.
///
/// `CNAME` pins the custom domain, while `_config.yml` and `README.md` are
/// the static host's site metadata and front page, maintained by hand in the
/// output repository rather than generated from shortcuts.
pub const PROTECTED_NAMES: &[&str] = &["CNAME", "_config.yml", "README.md"];

/// File written into each shortcut's leaf directory.
pub const INDEX_FILE: &str = "index.html";

/// Outcome of a full reconciliation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Paths removed during the clear phase.
    pub removed: Vec<PathBuf>,
    /// Number of `index.html` files written.
    pub written: usize,
}

/// Return `true` if a top-level entry named `name` survives the clear phase.
#[must_use]
pub fn is_protected(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
        || name.to_str().is_some_and(|n| PROTECTED_NAMES.contains(&n))
}

/// List the immediate children of `root` that the clear phase would delete,
/// sorted by path.
///
/// # Errors
///
/// Returns an error if `root` cannot be read.
pub fn deletion_candidates(root: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let read_err = |e| ReconcileError::io("read directory", root, e);
    let mut paths = Vec::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !is_protected(&entry.file_name()) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Delete every unprotected child of `root` once `prompt` approves the list.
///
/// The operator is asked exactly once, even when the list is empty, and
/// nothing is removed unless they confirm. Returns the removed paths.
///
/// # Errors
///
/// Returns [`ReconcileError::UserRejectedDeletion`] on rejection, or the
/// first filesystem or prompt failure.
pub fn clear(
    root: &Path,
    prompt: &dyn Confirm,
    log: &dyn Log,
) -> Result<Vec<PathBuf>, ReconcileError> {
    log.stage(&format!("Clearing {}", root.display()));
    let paths = deletion_candidates(root)?;
    if paths.is_empty() {
        log.info("nothing to delete");
    }

    if !prompt
        .confirm_deletion(&paths)
        .map_err(ReconcileError::Prompt)?
    {
        return Err(ReconcileError::UserRejectedDeletion);
    }

    for path in &paths {
        remove_entry(path)?;
        log.debug(&format!("deleted {}", path.display()));
    }
    log.info(&format!("deleted {} entries", paths.len()));
    Ok(paths)
}

/// Remove a file, symlink, or directory tree without following symlinks.
fn remove_entry(path: &Path) -> Result<(), ReconcileError> {
    let metadata =
        fs::symlink_metadata(path).map_err(|e| ReconcileError::io("inspect", path, e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| ReconcileError::io("remove", path, e))
}

/// Create `dir` unless it already exists as a directory.
///
/// Concurrent writers sharing a prefix may race here; losing the race is
/// success.
fn ensure_dir(dir: &Path) -> Result<(), ReconcileError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(ReconcileError::io("create directory", dir, e)),
    }
}

/// Create each missing directory along `shortcut`'s path and write `page`.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the page cannot be
/// written.
pub fn write_page(root: &Path, shortcut: &Shortcut, page: &str) -> Result<PathBuf, ReconcileError> {
    let mut dir = root.to_path_buf();
    for segment in shortcut.segments() {
        dir.push(segment);
        ensure_dir(&dir)?;
    }
    let file = dir.join(INDEX_FILE);
    fs::write(&file, page).map_err(|e| ReconcileError::io("write", &file, e))?;
    Ok(file)
}

/// Keep only the last shortcut for each leaf directory, preserving order.
///
/// Later entries overwrite earlier ones sharing a path; collapsing them up
/// front keeps that outcome deterministic under parallel writes.
#[must_use]
pub fn unique_pages<'a>(shortcuts: &'a [Shortcut], log: &dyn Log) -> Vec<&'a Shortcut> {
    let mut last: HashMap<Vec<&str>, usize> = HashMap::new();
    for (i, shortcut) in shortcuts.iter().enumerate() {
        if let Some(previous) = last.insert(shortcut.segments().collect(), i)
            && let Some(earlier) = shortcuts.get(previous)
        {
            log.warn(&format!(
                "shortcut {} ({}) is superseded by {} ({})",
                earlier.shortcut, earlier.title, shortcut.shortcut, shortcut.title
            ));
        }
    }
    let mut kept: Vec<usize> = last.into_values().collect();
    kept.sort_unstable();
    kept.into_iter().filter_map(|i| shortcuts.get(i)).collect()
}

/// Write one page per shortcut under `root`, in parallel.
///
/// Returns the number of pages written.
///
/// # Errors
///
/// Returns the first filesystem failure; other writes may already have
/// completed.
pub fn build<F>(
    root: &Path,
    shortcuts: &[Shortcut],
    render: F,
    log: &dyn Log,
) -> Result<usize, ReconcileError>
where
    F: Fn(&Shortcut) -> String + Sync,
{
    log.stage("Writing shortcuts");
    let pages = unique_pages(shortcuts, log);
    let total = pages.len();

    pages
        .par_iter()
        .enumerate()
        .try_for_each(|(i, &shortcut)| -> Result<(), ReconcileError> {
            let file = write_page(root, shortcut, &render(shortcut))?;
            log.debug(&format!(
                "wrote {} -> {} ({}/{total})",
                shortcut.shortcut,
                file.display(),
                i + 1
            ));
            Ok(())
        })?;

    log.info(&format!("{total} page(s) written"));
    Ok(total)
}

/// Clear `root`, then rebuild it from `shortcuts`.
///
/// # Errors
///
/// Propagates any [`clear`] or [`build`] failure. A failed build leaves the
/// tree partially written; rerunning is the recovery.
pub fn reconcile<F>(
    root: &Path,
    shortcuts: &[Shortcut],
    render: F,
    prompt: &dyn Confirm,
    log: &dyn Log,
) -> Result<Reconciliation, ReconcileError>
where
    F: Fn(&Shortcut) -> String + Sync,
{
    let removed = clear(root, prompt, log)?;
    let written = build(root, shortcuts, render, log)?;
    Ok(Reconciliation { removed, written })
}
