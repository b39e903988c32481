//! Operator confirmation before destructive steps.
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Blocking yes/no checkpoint consulted once per run before deletion.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Show the exact `paths` slated for deletion and wait for an answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be displayed or read.
    fn confirm_deletion(&self, paths: &[PathBuf]) -> io::Result<bool>;
}

/// Line-oriented prompt over standard input and output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm_deletion(&self, paths: &[PathBuf]) -> io::Result<bool> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        ask(&mut stdin.lock(), &mut stdout.lock(), paths)
    }
}

/// Write the deletion list to `output` and read one answer line from `input`.
///
/// End of input counts as a rejection.
///
/// # Errors
///
/// Returns an error if writing the prompt or reading the answer fails.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    paths: &[PathBuf],
) -> io::Result<bool> {
    writeln!(output, "Confirm you would like to delete the following files:")?;
    for path in paths {
        writeln!(output, "  - {}", path.display())?;
    }
    writeln!(output)?;
    write!(output, "Y/(N): ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(answer: &str, paths: &[PathBuf]) -> (bool, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let ok = ask(&mut input, &mut output, paths).unwrap();
        (ok, String::from_utf8(output).unwrap())
    }

    #[test]
    fn lists_every_path() {
        let paths = vec![PathBuf::from("/srv/out/a"), PathBuf::from("/srv/out/b")];
        let (_, shown) = run("n\n", &paths);
        assert_eq!(
            shown,
            "Confirm you would like to delete the following files:\n  - /srv/out/a\n  - /srv/out/b\n\nY/(N): "
        );
    }

    #[test]
    fn accepts_y_in_either_case() {
        assert!(run("Y\n", &[]).0);
        assert!(run("  y  \n", &[]).0);
    }

    #[test]
    fn rejects_anything_else() {
        for answer in ["n\n", "\n", "yes\n", "N\n", "maybe\n"] {
            assert!(!run(answer, &[]).0, "{answer:?} should reject");
        }
    }

    #[test]
    fn end_of_input_rejects() {
        assert!(!run("", &[]).0);
    }
}
