//! Site version lookup from the package manifest.
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::VersionError;

/// Default name of the manifest carrying the site version.
pub const VERSION_MANIFEST: &str = "package.json";

/// Read the `version` field from the JSON manifest at `path`.
///
/// A string `version` is used as-is; any other value, `null` included, is
/// used in its JSON form.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, is not valid JSON,
/// or has no `version` field.
pub fn load(path: &Path) -> Result<String, VersionError> {
    let contents = fs::read_to_string(path).map_err(|source| VersionError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Value =
        serde_json::from_str(&contents).map_err(|source| VersionError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    match manifest.get("version") {
        Some(Value::String(version)) => Ok(version.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(VersionError::MissingVersion(path.to_path_buf())),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manifest(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VERSION_MANIFEST);
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_version_field() {
        let (_dir, path) = manifest(r#"{ "name": "site", "version": "2.3.1" }"#);
        assert_eq!(load(&path).unwrap(), "2.3.1");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join(VERSION_MANIFEST)).unwrap_err();
        assert!(matches!(err, VersionError::Unreadable { .. }), "{err:?}");
    }

    #[test]
    fn missing_field_is_reported() {
        let (_dir, path) = manifest(r#"{ "name": "site" }"#);
        let err = load(&path).unwrap_err();
        assert!(matches!(err, VersionError::MissingVersion(_)), "{err:?}");
        assert!(err.to_string().contains("`version` must be set"));
    }

    #[test]
    fn numeric_version_is_stringified() {
        let (_dir, path) = manifest(r#"{ "version": 1 }"#);
        assert_eq!(load(&path).unwrap(), "1");
    }

    #[test]
    fn non_object_manifest_has_no_version() {
        let (_dir, path) = manifest("[\"1.0\"]");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, VersionError::MissingVersion(_)), "{err:?}");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let (_dir, path) = manifest("version = 1");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, VersionError::Malformed { .. }), "{err:?}");
    }
}
