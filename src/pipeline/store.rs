use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde_json::Value;

use crate::{
    foundation::error::{VoidError, VoidResult},
    schema::ArtifactRecord,
};

/// Files in the data directory that are not artifact records.
const RESERVED: &[&str] = &["manifest.json", "graph.json"];

pub fn record_path(data_dir: &Path, id: &str) -> PathBuf {
    data_dir.join(format!("{id}.json"))
}

/// Identifier of a file: its stem.
pub fn file_id(path: &Path) -> VoidResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| VoidError::validation(format!("no usable file name in '{}'", path.display())))
}

/// Replace `path` with the JSON encoding of `value` via a sibling temp file.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> VoidResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}'", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let f = File::create(&tmp).with_context(|| format!("create '{}'", tmp.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, value)?;
    w.flush().with_context(|| format!("write '{}'", tmp.display()))?;
    drop(w);

    fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
    Ok(())
}

pub fn read_json(path: &Path) -> VoidResult<Value> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| VoidError::serde(format!("parse '{}': {e}", path.display())))
}

/// Read, migrate and parse one artifact record.
pub fn load_record(path: &Path) -> VoidResult<ArtifactRecord> {
    let id = file_id(path)?;
    ArtifactRecord::from_value(read_json(path)?, &id)
}

/// Artifact record files in `data_dir`, sorted by name.
pub fn list_records(data_dir: &Path) -> VoidResult<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("read directory '{}'", data_dir.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("read entry in '{}'", data_dir.display()))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".json") && !RESERVED.contains(&name) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/store.rs"]
mod tests;
