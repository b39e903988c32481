//! Log path resolution and time formatting.
use std::fs;
use std::path::PathBuf;

/// Return the `$XDG_CACHE_HOME/shortcuts/` directory, creating it if needed.
pub(super) fn cache_dir() -> Option<PathBuf> {
    let cache_dir = std::env::var("XDG_CACHE_HOME").map_or_else(
        |_| {
            std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .map_or_else(|_| PathBuf::from("."), PathBuf::from)
                .join(".cache")
        },
        PathBuf::from,
    );
    let dir = cache_dir.join("shortcuts");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Return the log file path under `$XDG_CACHE_HOME/shortcuts/` (or `~/.cache/shortcuts/`).
pub(super) fn log_file_path() -> Option<PathBuf> {
    Some(cache_dir()?.join("build.log"))
}

/// Format the current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format the current UTC time as `HH:MM:SS`.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(unsafe_code)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::TEST_ENV_MUTEX;

    #[test]
    fn log_file_path_honours_xdg_cache_home() {
        let _lock = TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tmp = tempfile::tempdir().unwrap();
        // SAFETY: Protected by TEST_ENV_MUTEX; restored before lock is released.
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let path = log_file_path();
        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
        assert_eq!(path, Some(tmp.path().join("shortcuts").join("build.log")));
        assert!(tmp.path().join("shortcuts").is_dir());
    }

    #[test]
    fn format_utc_time_has_correct_format() {
        let s = format_utc_time();
        assert_eq!(s.len(), 8, "HH:MM:SS should be 8 chars");
        assert_eq!(&s[2..3], ":");
        assert_eq!(&s[5..6], ":");
    }

    #[test]
    fn format_utc_datetime_has_correct_format() {
        let s = format_utc_datetime();
        assert_eq!(s.len(), 19, "YYYY-MM-DD HH:MM:SS should be 19 chars");
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[10..11], " ");
    }
}
