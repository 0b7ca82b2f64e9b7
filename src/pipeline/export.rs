//! Whole-corpus passes: graph export, record migration, cloud projection.

use std::path::Path;

use crate::{
    config::{CameraConfig, GraphConfig},
    extract::Stroke,
    foundation::error::VoidResult,
    graph::{Descriptor, GraphBuilder, GraphNode, GraphRecord},
    pipeline::store,
    project::{CloudRecord, build_cloud},
    schema::{ArtifactRecord, SchemaVersion, detect_version, migrate_manifest, migrate_record},
};

/// Descriptors of one record from its embeddings, if it has any.
fn embedding_descriptors(record: &ArtifactRecord) -> Option<Vec<Descriptor>> {
    let id = record.id();
    let strokes: Vec<Descriptor> = record
        .strokes()
        .filter_map(|s| {
            Some(Descriptor {
                artifact: id.to_owned(),
                vector: s.embedding.clone()?,
                face: s.face.unwrap_or(false),
            })
        })
        .collect();
    if !strokes.is_empty() {
        return Some(strokes);
    }
    record.meta.embedding.as_ref().map(|v| {
        vec![Descriptor {
            artifact: id.to_owned(),
            vector: v.clone(),
            face: record.has_face(),
        }]
    })
}

fn color_descriptor(record: &ArtifactRecord) -> Descriptor {
    Descriptor {
        artifact: record.id().to_owned(),
        vector: record.meta.dominant_color.map(|c| f32::from(c) / 255.0).to_vec(),
        face: record.has_face(),
    }
}

/// Build the similarity graph over every readable record in `data_dir`.
///
/// Records are described by stroke embeddings, else their artifact
/// embedding. If any record has neither, the whole corpus falls back to
/// dominant colours so every vector has the same length.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn build_graph(data_dir: &Path, cfg: &GraphConfig) -> VoidResult<GraphRecord> {
    let mut records = Vec::new();
    for path in store::list_records(data_dir)? {
        match store::load_record(&path) {
            Ok(r) => records.push(r),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping record"),
        }
    }
    records.sort_by(|a, b| a.meta.id.cmp(&b.meta.id));

    let embedded: Option<Vec<Vec<Descriptor>>> = records.iter().map(embedding_descriptors).collect();
    let per_record = embedded.unwrap_or_else(|| {
        tracing::info!("not every record has embeddings; describing by dominant colour");
        records.iter().map(|r| vec![color_descriptor(r)]).collect()
    });

    let nodes = records
        .iter()
        .zip(&per_record)
        .map(|(r, d)| GraphNode {
            id: r.meta.id.clone(),
            file: r.meta.file.clone(),
            descriptors: d.len(),
        })
        .collect();
    let descriptors: Vec<Descriptor> = per_record.into_iter().flatten().collect();
    GraphBuilder::from_config(cfg).build(nodes, &descriptors)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrateReport {
    pub migrated: usize,
    pub current: usize,
    pub failed: usize,
    /// The manifest was rewritten.
    pub manifest: bool,
}

/// Rewrite every legacy record (and the manifest, if present) at the current schema.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn migrate_all(data_dir: &Path, manifest_path: &Path) -> VoidResult<MigrateReport> {
    let mut report = MigrateReport::default();
    for path in store::list_records(data_dir)? {
        match migrate_one(&path) {
            Ok(true) => report.migrated += 1,
            Ok(false) => report.current += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot migrate");
                report.failed += 1;
            }
        }
    }

    if manifest_path.exists() {
        let raw = store::read_json(manifest_path)?;
        let migrated = migrate_manifest(raw.clone())?;
        if migrated != raw {
            store::write_json_atomic(manifest_path, &migrated)?;
            report.manifest = true;
        }
    }
    tracing::info!(?report, "migration done");
    Ok(report)
}

/// `Ok(true)` when the file was rewritten.
fn migrate_one(path: &Path) -> VoidResult<bool> {
    let raw = store::read_json(path)?;
    if detect_version(&raw)? == SchemaVersion::Current {
        return Ok(false);
    }
    let id = store::file_id(path)?;
    let migrated = migrate_record(raw, &id)?;
    // Parse before writing so a record that cannot be read back is left alone.
    let record: ArtifactRecord = serde_json::from_value(migrated)?;
    store::write_json_atomic(path, &record)?;
    Ok(true)
}

/// Project one stored record into a render-ready cloud.
pub fn export_cloud(record_path: &Path, camera: &CameraConfig) -> VoidResult<CloudRecord> {
    let record = store::load_record(record_path)?;
    let strokes: Vec<Stroke> = record.strokes().cloned().collect();
    build_cloud(record.id(), record.meta.resolution, &strokes, camera)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/export.rs"]
mod tests;
