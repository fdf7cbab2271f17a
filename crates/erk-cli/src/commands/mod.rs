//! Command handler modules for erk-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod config;
pub mod replay;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read a UTF-8 JSON file (a leading BOM is tolerated) into `T`.
pub fn read_json_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read failed: {}", path))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = std::str::from_utf8(bytes).context("file must be UTF-8 text")?;
    serde_json::from_str(raw.trim()).with_context(|| format!("invalid JSON in {}", path))
}

pub fn path_refs(paths: &[String]) -> Vec<&str> {
    paths.iter().map(|s| s.as_str()).collect()
}
