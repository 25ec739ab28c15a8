use std::fs;
use std::path::PathBuf;

use anyhow::Result;

pub mod fixtures;
pub mod operations_tests;

/// Write a one-entry-per-line list file (URLs, SKUs, argfiles).
pub fn write_list(scratch: &fixtures::Scratch, name: &str, lines: &[&str]) -> Result<PathBuf> {
    let path = scratch.path(name);
    fs::write(&path, lines.join("\n"))?;
    Ok(path)
}
