//! Static redirect page generator.
//!
//! Reads a JSON list of shortcuts (short path → target URL and title),
//! validates it, clears the configured output directory after operator
//! confirmation, and writes one rendered `index.html` per shortcut into a
//! directory tree mirroring the shortcut path.
//!
//! The crate is organised leaf-first:
//!
//! - **[`config`]** — parse and validate `config.json`
//! - **[`render`]** — placeholder substitution for templates
//! - **[`tree`]** — clear-then-rebuild of the output tree
//! - **[`manifest`]** — `data.lastRun` bookkeeping and the generated listing
//! - **[`pipeline`]** — orchestration of one full run
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod tree;
pub mod version;
