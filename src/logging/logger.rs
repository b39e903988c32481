//! Structured logger routed through [`tracing`].
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::Log;

/// Target used for stage headers so formatters can render them distinctly.
pub(super) const STAGE_TARGET: &str = "shortcuts::stage";

/// Logger that forwards every message to the global [`tracing`] subscriber.
///
/// Console filtering (quiet / verbose) and the persistent log file are both
/// configured by [`init_subscriber`](super::subscriber::init_subscriber);
/// the logger itself only counts warnings for the end-of-run summary.
#[derive(Debug, Default)]
pub struct Logger {
    warnings: AtomicUsize,
}

impl Logger {
    /// Create a new logger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warnings: AtomicUsize::new(0),
        }
    }

    /// Number of warnings logged so far.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}
