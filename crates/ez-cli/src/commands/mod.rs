//! CLI subcommand implementations

pub mod debug;
pub mod debugserver;
pub mod run;

use anyhow::{Context, Result};
use std::fs;

/// Read a source file, attaching the path to any I/O error.
pub(crate) fn read_source(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read source file: {path}"))
}
