//! Fail-fast validation of the configuration document.
//!
//! Rules run in a fixed order and the first violation is returned:
//!
//! 1. the document parses and has a `configuration` object
//! 2. `path` is an allowed target root naming an existing directory
//! 3. `shortcuts` is an array of well-formed shortcut objects
//! 4. `template` names an existing regular file
//!
//! The only side effects are the existence checks against the filesystem.
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{Shortcut, ValidConfig};
use crate::error::{ConfigError, ShortcutError, TemplateError};
use crate::logging::Log;

/// Prefixes a target root must start with. A bare relative name would let a
/// typo clear a subfolder of the site itself.
const ALLOWED_ROOT_PREFIXES: &[&str] = &["..", "~", "/"];

/// Keys every shortcut object must carry.
const REQUIRED_KEYS: [&str; 3] = ["shortcut", "url", "title"];

/// Punctuation left untouched by URI encoding (RFC 3986 reserved plus
/// unreserved marks, and `#`).
const URI_SAFE_PUNCTUATION: &str = ";,/?:@&=+$-_.!~*'()#";

/// Validate a raw configuration document.
///
/// Relative `path` and `template` values resolve against `base`; a leading
/// `~` expands to the home directory.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered.
pub fn validate(raw: &str, base: &Path, log: &dyn Log) -> Result<ValidConfig, ConfigError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| ConfigError::MalformedDocument {
            reason: e.to_string(),
        })?;

    let (root, shortcuts, template) = {
        let configuration = document
            .get("configuration")
            .and_then(Value::as_object)
            .ok_or_else(|| ConfigError::MalformedDocument {
                reason: "expected a `configuration` object at the top level".to_string(),
            })?;
        check_configuration(configuration, base, log)?
    };

    Ok(ValidConfig {
        document,
        root,
        template,
        shortcuts,
    })
}

fn check_configuration(
    configuration: &Map<String, Value>,
    base: &Path,
    log: &dyn Log,
) -> Result<(PathBuf, Vec<Shortcut>, PathBuf), ConfigError> {
    log.info("checking path");
    let root = check_root(configuration.get("path"), base)?;
    log.debug(&format!("target root: {}", root.display()));

    log.info("checking shortcuts");
    let shortcuts = check_shortcuts(configuration.get("shortcuts"), log)?;
    log.info(&format!("{} shortcut(s) valid", shortcuts.len()));

    log.info("checking template");
    let template = check_template(configuration.get("template"), base)?;

    Ok((root, shortcuts, template))
}

/// Render a JSON value for error messages, `<missing>` when absent.
fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<missing>".to_string(), Value::to_string)
}

/// Return `true` if `raw` is spelled as an allowed target root.
#[must_use]
pub fn is_allowed_root(raw: &str) -> bool {
    raw != "/" && ALLOWED_ROOT_PREFIXES.iter().any(|p| raw.starts_with(p))
}

/// Resolve a configured path against `base`, expanding `~` and `~/…`.
///
/// `~user` forms are not expanded.
#[must_use]
pub fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    let home = || std::env::var_os("HOME").map(PathBuf::from);
    if raw == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = home()
    {
        return home.join(rest);
    }
    base.join(raw)
}

fn check_root(value: Option<&Value>, base: &Path) -> Result<PathBuf, ConfigError> {
    let Some(raw) = value.and_then(Value::as_str) else {
        return Err(ConfigError::InvalidPath(describe(value)));
    };
    if !is_allowed_root(raw) {
        return Err(ConfigError::InvalidPath(describe(value)));
    }

    let resolved = resolve_path(raw, base);
    let is_dir = fs::symlink_metadata(&resolved).is_ok_and(|m| m.is_dir());
    if !is_dir {
        return Err(ConfigError::PathNotFound(raw.to_string()));
    }

    let canonical =
        fs::canonicalize(&resolved).map_err(|_| ConfigError::PathNotFound(raw.to_string()))?;
    // Catches spellings such as `/.` or `/tmp/..`.
    if canonical.parent().is_none() {
        return Err(ConfigError::InvalidPath(describe(value)));
    }
    Ok(canonical)
}

fn check_shortcuts(value: Option<&Value>, log: &dyn Log) -> Result<Vec<Shortcut>, ConfigError> {
    let entries = value
        .and_then(Value::as_array)
        .ok_or(ConfigError::MissingShortcuts)?;
    let total = entries.len();

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            log.debug(&format!("checking shortcut ({}/{total})", i + 1));
            check_shortcut(entry).map_err(|kind| ConfigError::Shortcut {
                index: i + 1,
                shortcut: entry.to_string(),
                kind,
            })
        })
        .collect()
}

/// Validate a single shortcut entry.
///
/// # Errors
///
/// Returns the [`ShortcutError`] for the first rule the entry breaks.
pub fn check_shortcut(entry: &Value) -> Result<Shortcut, ShortcutError> {
    let object = entry.as_object().ok_or(ShortcutError::NotObject)?;
    if !REQUIRED_KEYS.iter().all(|key| object.contains_key(*key)) {
        return Err(ShortcutError::MissingKeys);
    }

    let field = |key: &str| object.get(key).and_then(Value::as_str);
    let (Some(path), Some(url), Some(title)) = (field("shortcut"), field("url"), field("title"))
    else {
        return Err(ShortcutError::FieldType);
    };

    if !is_valid_shortcut_path(path) {
        return Err(ShortcutError::InvalidPath);
    }
    Ok(Shortcut::new(path, url, title))
}

/// Return `true` if `path` can be mapped onto the output tree.
///
/// The path must start with `/`, contain no `//`, have no `.` or `..`
/// segments, and be unchanged by URI encoding.
#[must_use]
pub fn is_valid_shortcut_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains("//")
        && path.chars().all(is_uri_char)
        && !path.split('/').any(|segment| segment == "." || segment == "..")
}

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || URI_SAFE_PUNCTUATION.contains(c)
}

fn check_template(value: Option<&Value>, base: &Path) -> Result<PathBuf, TemplateError> {
    let raw = value
        .and_then(Value::as_str)
        .ok_or(TemplateError::Invalid)?;
    let path = resolve_path(raw, base);
    let metadata = fs::metadata(&path).map_err(|_| TemplateError::NotFound(raw.to_string()))?;
    if !metadata.is_file() {
        return Err(TemplateError::NotFile(raw.to_string()));
    }
    Ok(path)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use proptest::prelude::*;
    use serde_json::json;

    /// A site directory with an `out/` target and a template file.
    struct Site {
        dir: tempfile::TempDir,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir(dir.path().join("out")).unwrap();
            fs::write(dir.path().join("template.html"), "{{url}}").unwrap();
            Self { dir }
        }

        fn out(&self) -> String {
            self.dir.path().join("out").display().to_string()
        }

        fn template(&self) -> String {
            self.dir.path().join("template.html").display().to_string()
        }

        fn check(&self, doc: &Value) -> Result<ValidConfig, ConfigError> {
            validate(&doc.to_string(), self.dir.path(), &Logger::new())
        }

        fn with_configuration(&self, configuration: Value) -> Result<ValidConfig, ConfigError> {
            self.check(&json!({ "configuration": configuration }))
        }
    }

    fn shortcut(path: &str) -> Value {
        json!({ "shortcut": path, "url": "https://x.test", "title": "X" })
    }

    // -----------------------------------------------------------------------
    // document
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_non_json() {
        let site = Site::new();
        let err = validate("{ not json", site.dir.path(), &Logger::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }), "{err:?}");
    }

    #[test]
    fn rejects_missing_configuration() {
        let site = Site::new();
        let err = site.check(&json!({ "data": {} })).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }), "{err:?}");
    }

    #[test]
    fn rejects_non_object_configuration() {
        let site = Site::new();
        let err = site.check(&json!({ "configuration": [1, 2] })).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }), "{err:?}");
    }

    #[test]
    fn accepts_valid_document_unchanged() {
        let site = Site::new();
        let doc = json!({
            "configuration": {
                "path": site.out(),
                "template": site.template(),
                "shortcuts": [shortcut("/go")],
                "extra": true,
            },
            "data": { "lastRun": "yesterday" },
        });
        let config = site.check(&doc).unwrap();
        assert_eq!(config.document, doc);
        assert_eq!(config.shortcuts, vec![Shortcut::new("/go", "https://x.test", "X")]);
        assert_eq!(config.root, fs::canonicalize(site.out()).unwrap());
    }

    // -----------------------------------------------------------------------
    // path
    // -----------------------------------------------------------------------

    #[test]
    fn missing_path_is_invalid_path() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({ "template": site.template(), "shortcuts": [] }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(ref v) if v == "<missing>"), "{err:?}");
    }

    #[test]
    fn non_string_path_is_invalid_path() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({ "path": 7, "template": site.template(), "shortcuts": [] }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(_)), "{err:?}");
    }

    #[test]
    fn subfolder_paths_are_rejected() {
        for raw in ["out", "./out", "site/out", ".hidden", ""] {
            assert!(!is_allowed_root(raw), "{raw} should be rejected");
        }
    }

    #[test]
    fn root_is_rejected() {
        assert!(!is_allowed_root("/"));
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": "/",
                "template": site.template(),
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(_)), "{err:?}");
    }

    #[test]
    fn root_spelled_differently_is_rejected() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": "/.",
                "template": site.template(),
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(_)), "{err:?}");
    }

    #[test]
    fn allowed_prefixes_are_accepted() {
        for raw in ["../out", "..", "~", "~/site", "/srv/site"] {
            assert!(is_allowed_root(raw), "{raw} should be allowed");
        }
    }

    #[test]
    fn nonexistent_path_is_not_found() {
        let site = Site::new();
        let missing = site.dir.path().join("nope").display().to_string();
        let err = site
            .with_configuration(json!({
                "path": missing,
                "template": site.template(),
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PathNotFound(ref p) if *p == missing), "{err:?}");
    }

    #[test]
    fn file_path_is_not_found() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": site.template(),
                "template": site.template(),
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PathNotFound(_)), "{err:?}");
    }

    #[test]
    fn parent_relative_path_resolves_against_base() {
        let site = Site::new();
        let base = site.dir.path().join("site");
        fs::create_dir(&base).unwrap();
        let doc = json!({ "configuration": {
            "path": "../out",
            "template": site.template(),
            "shortcuts": [],
        }});
        let config = validate(&doc.to_string(), &base, &Logger::new()).unwrap();
        assert_eq!(config.root, fs::canonicalize(site.out()).unwrap());
    }

    #[test]
    fn resolve_path_joins_relative_onto_base() {
        assert_eq!(
            resolve_path("../out", Path::new("/srv/site")),
            PathBuf::from("/srv/site/../out")
        );
        assert_eq!(resolve_path("/abs", Path::new("/srv")), PathBuf::from("/abs"));
        assert_eq!(
            resolve_path("~other/x", Path::new("/srv")),
            PathBuf::from("/srv/~other/x")
        );
    }

    // -----------------------------------------------------------------------
    // shortcuts
    // -----------------------------------------------------------------------

    #[test]
    fn missing_shortcuts_is_reported() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({ "path": site.out(), "template": site.template() }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingShortcuts), "{err:?}");
    }

    #[test]
    fn non_array_shortcuts_is_reported() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": site.out(),
                "template": site.template(),
                "shortcuts": { "shortcut": "/go" },
            }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingShortcuts), "{err:?}");
    }

    #[test]
    fn shortcut_schema_errors_in_order() {
        assert_eq!(check_shortcut(&json!("/go")), Err(ShortcutError::NotObject));
        assert_eq!(
            check_shortcut(&json!({ "shortcut": "/go", "url": "u" })),
            Err(ShortcutError::MissingKeys)
        );
        assert_eq!(
            check_shortcut(&json!({ "shortcut": "/go", "url": "u", "title": 3 })),
            Err(ShortcutError::FieldType)
        );
        assert_eq!(
            check_shortcut(&json!({ "shortcut": "go", "url": "u", "title": "t" })),
            Err(ShortcutError::InvalidPath)
        );
    }

    #[test]
    fn first_bad_shortcut_is_reported_with_position() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": site.out(),
                "template": site.template(),
                "shortcuts": [shortcut("/ok"), shortcut("/a//b"), "not even an object"],
            }))
            .unwrap_err();
        match err {
            ConfigError::Shortcut {
                index,
                shortcut,
                kind,
            } => {
                assert_eq!(index, 2);
                assert!(shortcut.contains("/a//b"), "{shortcut}");
                assert_eq!(kind, ShortcutError::InvalidPath);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn shortcut_path_rules() {
        for ok in [
            "/",
            "/go",
            "/a/b/c",
            "/a/b/",
            "/x-y_z.html",
            "/q?a=1&b=2",
            "/~me",
            "/.well-known",
        ] {
            assert!(is_valid_shortcut_path(ok), "{ok} should be valid");
        }
        for bad in [
            "go",
            "",
            "//go",
            "/a//b",
            "/with space",
            "/caf\u{e9}",
            "/100%",
            "/a\\b",
            "/a\"b",
            "/../etc",
            "/a/./b",
            "/a/..",
        ] {
            assert!(!is_valid_shortcut_path(bad), "{bad} should be invalid");
        }
    }

    // -----------------------------------------------------------------------
    // template
    // -----------------------------------------------------------------------

    #[test]
    fn missing_template_is_invalid() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({ "path": site.out(), "shortcuts": [] }))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Template(TemplateError::Invalid)),
            "{err:?}"
        );
    }

    #[test]
    fn nonexistent_template_is_not_found() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": site.out(),
                "template": "/no/such/tpl",
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::Template(TemplateError::NotFound(ref p)) if p == "/no/such/tpl"
            ),
            "{err:?}"
        );
    }

    #[test]
    fn directory_template_is_not_a_file() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({
                "path": site.out(),
                "template": site.out(),
                "shortcuts": [],
            }))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Template(TemplateError::NotFile(_))),
            "{err:?}"
        );
    }

    #[test]
    fn path_is_checked_before_template() {
        let site = Site::new();
        let err = site
            .with_configuration(json!({ "path": "out", "shortcuts": [] }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(_)), "{err:?}");
    }

    #[test]
    fn duplicate_shortcut_paths_are_accepted() {
        let site = Site::new();
        let config = site
            .with_configuration(json!({
                "path": site.out(),
                "template": site.template(),
                "shortcuts": [shortcut("/go"), shortcut("/go")],
            }))
            .unwrap();
        assert_eq!(config.shortcuts.len(), 2);
    }

    // -----------------------------------------------------------------------
    // properties
    // -----------------------------------------------------------------------

    /// Characters `encodeURI` leaves as they are.
    const URI_UNESCAPED: &str =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789;,/?:@&=+$-_.!~*'()#";

    /// Percent-encode `s` the way `encodeURI` does.
    fn encode_uri(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if URI_UNESCAPED.contains(c) {
                out.push(c);
            } else {
                let mut buf = [0_u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
        out
    }

    #[test]
    fn encode_uri_reference_matches_known_values() {
        assert_eq!(encode_uri("/a b"), "/a%20b");
        assert_eq!(encode_uri("/caf\u{e9}"), "/caf%C3%A9");
        assert_eq!(encode_uri("/100%"), "/100%25");
        assert_eq!(encode_uri("/q?a=1#top"), "/q?a=1#top");
    }

    proptest! {
        #[test]
        fn anchored_roots_are_allowed_unless_bare_root(
            prefix in prop::sample::select(vec!["..", "~", "/"]),
            rest in "\\PC{0,16}"
        ) {
            let raw = format!("{prefix}{rest}");
            prop_assert_eq!(is_allowed_root(&raw), raw != "/");
        }

        #[test]
        fn unanchored_roots_are_refused(raw in "([^./~]|\\.[^.])\\PC{0,16}") {
            prop_assert!(!is_allowed_root(&raw), "{raw:?}");
        }

        #[test]
        fn shortcut_path_rule_agrees_with_uri_encoding(
            raw in prop_oneof!["/?[a-zA-Z0-9/._~%#?\u{e9} \"-]{0,16}", "\\PC{0,16}"]
        ) {
            let expected = raw.starts_with('/')
                && !raw.contains("//")
                && encode_uri(&raw) == raw
                && !raw.split('/').any(|segment| segment == "." || segment == "..");
            prop_assert_eq!(is_valid_shortcut_path(&raw), expected, "{:?}", raw);
        }
    }
}
