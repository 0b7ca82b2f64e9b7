use std::path::Path;

use crate::{
    foundation::error::VoidResult,
    graph::nearest_neighbors,
    pipeline::store,
    schema::{ManifestNode, ManifestRecord},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    /// Records that could not be read or migrated.
    pub skipped: usize,
}

/// Rebuild the manifest from every record in `data_dir`.
///
/// Nodes are ordered by id; each lists its `neighbors` closest artifacts by
/// dominant colour.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn build_manifest(data_dir: &Path, neighbors: usize) -> VoidResult<(ManifestRecord, IndexReport)> {
    let mut report = IndexReport::default();
    let mut nodes = Vec::new();

    for path in store::list_records(data_dir)? {
        let record = match store::load_record(&path) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping record");
                report.skipped += 1;
                continue;
            }
        };
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        nodes.push(ManifestNode {
            id: record.meta.id.clone(),
            file,
            title: record.meta.title.clone(),
            res: record.meta.resolution,
            color: record.meta.dominant_color,
            strokes: record.meta.stroke_count,
            regions: record.ghost_count(),
            neighbors: Vec::new(),
            extra: Default::default(),
        });
    }
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let colors: Vec<(String, [u8; 3])> = nodes.iter().map(|n| (n.id.clone(), n.color)).collect();
    for (node, links) in nodes.iter_mut().zip(nearest_neighbors(&colors, neighbors)) {
        node.neighbors = links;
    }

    report.indexed = nodes.len();
    tracing::info!(indexed = report.indexed, skipped = report.skipped, "manifest built");
    let manifest = ManifestRecord {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_nodes: nodes.len(),
        nodes,
    };
    Ok((manifest, report))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/index.rs"]
mod tests;
