// Shared helpers for integration tests.
//
// Provides a temporary site directory laid out the way the `shortcuts`
// binary expects (`site/config.json`, `site/package.json`,
// `site/template.html`) next to an output root (`out/`), plus a scripted
// confirmation prompt.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use shortcuts_cli::pipeline::SitePaths;
use shortcuts_cli::prompt::Confirm;

/// Template used by fixtures unless overridden.
pub const PAGE_TEMPLATE: &str =
    "<meta http-equiv=\"refresh\" content=\"0; url={{url}}\"><title>{{title}}</title><!-- {{ver}} -->";

/// An isolated site backed by a [`tempfile::TempDir`].
pub struct SiteFixture {
    /// Temporary directory holding `site/` and `out/`.
    pub dir: tempfile::TempDir,
}

impl SiteFixture {
    /// Directory containing `config.json` and friends.
    pub fn site(&self) -> PathBuf {
        self.dir.path().join("site")
    }

    /// Output root, configured as `../out`.
    pub fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Paths for a pipeline run rooted at [`site`](Self::site).
    pub fn paths(&self) -> SitePaths {
        SitePaths::in_dir(self.site())
    }

    /// Parsed contents of `config.json`.
    pub fn config_document(&self) -> Value {
        let text = std::fs::read_to_string(self.site().join("config.json")).expect("read config");
        serde_json::from_str(&text).expect("parse config")
    }

    /// Write `contents` to `out/<rel>`, creating parents.
    pub fn seed_output(&self, rel: &str, contents: &str) {
        let path = self.out().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create output parent");
        }
        std::fs::write(path, contents).expect("seed output file");
    }

    /// Every regular file under `out/`, relative and sorted.
    pub fn output_files(&self) -> Vec<PathBuf> {
        fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
            for entry in std::fs::read_dir(dir).expect("read dir") {
                let path = entry.expect("dir entry").path();
                if path.is_dir() {
                    walk(&path, root, out);
                } else {
                    out.push(path.strip_prefix(root).expect("strip prefix").to_path_buf());
                }
            }
        }
        let mut files = Vec::new();
        walk(&self.out(), &self.out(), &mut files);
        files.sort();
        files
    }
}

/// Fluent builder for [`SiteFixture`].
pub struct SiteBuilder {
    shortcuts: Vec<Value>,
    version: Option<String>,
    template: String,
    data: Option<Value>,
}

impl SiteBuilder {
    /// Begin a site with version `1.0`, no shortcuts, and [`PAGE_TEMPLATE`].
    pub fn new() -> Self {
        Self {
            shortcuts: Vec::new(),
            version: Some("1.0".to_string()),
            template: PAGE_TEMPLATE.to_string(),
            data: None,
        }
    }

    /// Add a shortcut entry.
    pub fn shortcut(mut self, path: &str, url: &str, title: &str) -> Self {
        self.shortcuts
            .push(json!({ "shortcut": path, "url": url, "title": title }));
        self
    }

    /// Set the `version` field of `package.json`; `None` omits it.
    pub fn version(mut self, version: Option<&str>) -> Self {
        self.version = version.map(String::from);
        self
    }

    /// Set an initial `data` member.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Write every file and return the fixture.
    pub fn build(self) -> SiteFixture {
        let dir = tempfile::tempdir().expect("create temp dir");
        let site = dir.path().join("site");
        std::fs::create_dir(&site).expect("create site dir");
        std::fs::create_dir(dir.path().join("out")).expect("create out dir");

        std::fs::write(site.join("template.html"), &self.template).expect("write template");

        let manifest = match &self.version {
            Some(v) => json!({ "name": "site", "version": v }),
            None => json!({ "name": "site" }),
        };
        std::fs::write(site.join("package.json"), manifest.to_string()).expect("write manifest");

        let mut config = json!({
            "configuration": {
                "path": "../out",
                "template": "template.html",
                "shortcuts": self.shortcuts,
            }
        });
        if let (Some(data), Some(object)) = (self.data, config.as_object_mut()) {
            object.insert("data".to_string(), data);
        }
        std::fs::write(
            site.join("config.json"),
            serde_json::to_string_pretty(&config).expect("serialize config"),
        )
        .expect("write config");

        SiteFixture { dir }
    }
}

/// A [`Confirm`] that answers with a fixed value and records what it was shown.
pub struct ScriptedPrompt {
    answer: bool,
    shown: RefCell<Vec<Vec<PathBuf>>>,
}

impl ScriptedPrompt {
    /// Always approve.
    pub fn accept() -> Self {
        Self {
            answer: true,
            shown: RefCell::new(Vec::new()),
        }
    }

    /// Always reject.
    pub fn reject() -> Self {
        Self {
            answer: false,
            shown: RefCell::new(Vec::new()),
        }
    }

    /// Deletion lists shown so far, one per prompt.
    pub fn shown(&self) -> Vec<Vec<PathBuf>> {
        self.shown.borrow().clone()
    }
}

impl Confirm for ScriptedPrompt {
    fn confirm_deletion(&self, paths: &[PathBuf]) -> io::Result<bool> {
        self.shown.borrow_mut().push(paths.to_vec());
        Ok(self.answer)
    }
}
