//! Core logging types: console verbosity and the [`Log`] trait.

/// How much progress output reaches the console.
///
/// The persistent log file always receives every event regardless of this
/// setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet,
    /// Stage headers and progress lines.
    #[default]
    Normal,
    /// Everything, including per-item debug lines.
    Verbose,
}

impl Verbosity {
    /// Derive the verbosity from the `--quiet` / `--verbose` flags.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Logging capability handed to every pipeline component.
///
/// Components never consult global state to decide whether to print;
/// filtering happens once, in the subscriber installed at startup.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational progress message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn flags_map_to_verbosity() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }
}
