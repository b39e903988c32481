//! Run bookkeeping: the `data.lastRun` record and the generated listing.
use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::config::{Shortcut, ValidConfig};
use crate::error::ManifestError;
use crate::logging::Log;
use crate::render::{SHORTCUTS_PLACEHOLDER, VERSION_PLACEHOLDER, render};

/// Default name of the generated listing document.
pub const LISTING_FILE: &str = "README.md";

/// Template for the listing document.
pub const LISTING_TEMPLATE: &str = include_str!("README_TEMPLATE.md");

/// Format a run timestamp as RFC 3339 UTC with millisecond precision.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Return a copy of `document` with `data.lastRun` set to `at`.
///
/// A missing or non-object `data` member is replaced by a fresh object; every
/// other member is kept as-is.
#[must_use]
pub fn with_last_run(document: &Value, at: DateTime<Utc>) -> Value {
    let mut updated = document.clone();
    if let Value::Object(root) = &mut updated {
        let data = root
            .entry("data")
            .or_insert_with(|| Value::Object(Map::new()));
        if !data.is_object() {
            *data = Value::Object(Map::new());
        }
        if let Value::Object(data) = data {
            data.insert("lastRun".to_string(), Value::String(format_timestamp(at)));
        }
    }
    updated
}

/// Rewrite the configuration store at `path` with `data.lastRun` set to `at`.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized or written.
pub fn record_last_run(
    path: &Path,
    document: &Value,
    at: DateTime<Utc>,
) -> Result<(), ManifestError> {
    let mut text = serde_json::to_string_pretty(&with_last_run(document, at))?;
    text.push('\n');
    fs::write(path, text).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One listing line for `shortcut`.
#[must_use]
pub fn listing_entry(shortcut: &Shortcut) -> String {
    format!(
        "- [{}]({}): <{}>",
        shortcut.title, shortcut.shortcut, shortcut.url
    )
}

/// Render the listing template with `version` and one line per shortcut.
#[must_use]
pub fn render_listing(template: &str, version: &str, shortcuts: &[Shortcut]) -> String {
    let entries = shortcuts
        .iter()
        .map(listing_entry)
        .collect::<Vec<_>>()
        .join("\n");
    render(
        template,
        &[(VERSION_PLACEHOLDER, version), (SHORTCUTS_PLACEHOLDER, &entries)],
    )
}

/// Regenerate the listing document at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_listing(
    path: &Path,
    version: &str,
    shortcuts: &[Shortcut],
) -> Result<(), ManifestError> {
    fs::write(path, render_listing(LISTING_TEMPLATE, version, shortcuts)).map_err(|source| {
        ManifestError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Persist the last-run record and regenerate the listing, concurrently.
///
/// Both steps always run to completion; the output tree is never rolled
/// back on failure.
///
/// # Errors
///
/// Returns the last-run failure if any, otherwise the listing failure. A
/// listing failure that is not returned is logged.
pub fn update(
    config_path: &Path,
    listing_path: &Path,
    config: &ValidConfig,
    version: &str,
    at: DateTime<Utc>,
    log: &dyn Log,
) -> Result<(), ManifestError> {
    log.stage("Updating manifest");
    let (recorded, listed) = rayon::join(
        || record_last_run(config_path, &config.document, at),
        || write_listing(listing_path, version, &config.shortcuts),
    );

    match (recorded, listed) {
        (Ok(()), Ok(())) => {
            log.info(&format!("last run recorded as {}", format_timestamp(at)));
            log.info(&format!("listing written to {}", listing_path.display()));
            Ok(())
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(e), Err(listing)) => {
            log.error(&listing.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn timestamp_is_rfc3339_millis() {
        insta::assert_snapshot!(format_timestamp(at()), @"2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn last_run_is_added_without_touching_configuration() {
        let doc = json!({ "configuration": { "path": "../out", "shortcuts": [] } });
        let updated = with_last_run(&doc, at());
        assert_eq!(updated["configuration"], doc["configuration"]);
        assert_eq!(updated["data"]["lastRun"], "2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn last_run_overwrites_previous_value_and_keeps_siblings() {
        let doc = json!({ "configuration": {}, "data": { "lastRun": "old", "note": "keep" } });
        let updated = with_last_run(&doc, at());
        assert_eq!(updated["data"]["lastRun"], "2024-05-06T07:08:09.000Z");
        assert_eq!(updated["data"]["note"], "keep");
    }

    #[test]
    fn non_object_data_is_replaced() {
        let doc = json!({ "configuration": {}, "data": null });
        let updated = with_last_run(&doc, at());
        assert_eq!(updated["data"], json!({ "lastRun": "2024-05-06T07:08:09.000Z" }));
    }

    #[test]
    fn record_preserves_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let doc: Value =
            serde_json::from_str(r#"{"configuration":{"template":"t","path":"/p","shortcuts":[]}}"#)
                .unwrap();
        record_last_run(&path, &doc, at()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("}\n"));
        let template_at = written.find("\"template\"").unwrap();
        let path_at = written.find("\"path\"").unwrap();
        assert!(template_at < path_at, "{written}");
        let reread: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(reread["data"]["lastRun"], "2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn listing_entry_format() {
        let shortcut = Shortcut::new("/go", "https://x.test", "X");
        insta::assert_snapshot!(listing_entry(&shortcut), @"- [X](/go): <https://x.test>");
    }

    #[test]
    fn listing_keeps_configuration_order() {
        let shortcuts = vec![
            Shortcut::new("/b", "https://b.test", "B"),
            Shortcut::new("/a", "https://a.test", "A"),
        ];
        let out = render_listing("v{{ver}}\n{{shortcuts}}\n", "1.2.3", &shortcuts);
        assert_eq!(
            out,
            "v1.2.3\n- [B](/b): <https://b.test>\n- [A](/a): <https://a.test>\n"
        );
    }

    #[test]
    fn bundled_template_has_both_placeholders() {
        assert!(LISTING_TEMPLATE.contains(VERSION_PLACEHOLDER));
        assert!(LISTING_TEMPLATE.contains(SHORTCUTS_PLACEHOLDER));
    }

    #[test]
    fn update_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let listing_path = dir.path().join(LISTING_FILE);
        let config = ValidConfig {
            document: json!({ "configuration": {} }),
            root: dir.path().to_path_buf(),
            template: dir.path().join("template.html"),
            shortcuts: vec![Shortcut::new("/go", "https://x.test", "X")],
        };

        update(
            &config_path,
            &listing_path,
            &config,
            "1.0",
            at(),
            &crate::logging::Logger::new(),
        )
        .unwrap();

        let listing = fs::read_to_string(&listing_path).unwrap();
        assert!(listing.contains("site version 1.0"), "{listing}");
        assert!(listing.contains("- [X](/go): <https://x.test>"), "{listing}");
        let stored: Value =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(stored["data"]["lastRun"], "2024-05-06T07:08:09.000Z");
    }

    #[test]
    fn update_reports_unwritable_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidConfig {
            document: json!({ "configuration": {} }),
            root: dir.path().to_path_buf(),
            template: dir.path().join("template.html"),
            shortcuts: Vec::new(),
        };
        let err = update(
            &dir.path().join("missing/config.json"),
            &dir.path().join(LISTING_FILE),
            &config,
            "1.0",
            at(),
            &crate::logging::Logger::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }), "{err:?}");
        assert!(dir.path().join(LISTING_FILE).exists());
    }
}
