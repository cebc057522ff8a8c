//! File I/O for the dependency listing and the JSON record files.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::models::Dependency;

/// Read a dependency listing: one identifier per line.
///
/// Blank lines and `#` comments are skipped. Only the first whitespace-separated
/// token of a line is kept, so `go list -m all` output can be used directly.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading dependency listing {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// Read a JSON array of dependency records. An empty file yields no records.
pub fn read_records(path: &Path) -> Result<Vec<Dependency>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Write records as an indented JSON array and sync the file to disk.
pub fn write_records(path: &Path, deps: &[Dependency]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    deps.serialize(&mut ser)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(&buf)
        .with_context(|| format!("writing {}", path.display()))?;
    file.sync_all()?;

    tracing::debug!(path = %path.display(), count = deps.len(), "wrote records");
    Ok(())
}

/// Fail early when an output path cannot possibly be written.
pub fn ensure_writable(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        bail!("output directory {} does not exist", parent.display());
    }
    if path.is_dir() {
        bail!("output path {} is a directory", path.display());
    }
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.permissions().readonly() {
            bail!("output file {} is read-only", path.display());
        }
    }
    Ok(())
}
