//! Persisted record shapes.
//!
//! Records on disk may be any historical version; [`migrate`] brings a raw
//! JSON value up to [`CURRENT_SCHEMA`] before it is parsed into these types.

pub mod migrate;

use serde_json::{Map, Value};

use crate::{
    extract::Stroke,
    foundation::core::{Resolution, Rgb8},
    foundation::error::{VoidError, VoidResult},
};

pub use migrate::{SchemaVersion, detect_version, migrate_manifest, migrate_record};

/// Version written into `meta.schema` by this crate.
pub const CURRENT_SCHEMA: u32 = 2;

/// Resolution assumed for records that never stored one.
pub const DEFAULT_RESOLUTION: [u32; 2] = [1024, 1024];

/// Year assumed when the identifier carries none.
pub const DEFAULT_YEAR: &str = "2024";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArtifactMeta {
    pub schema: u32,
    pub id: String,
    /// Source image file name.
    pub file: String,
    pub original_file: String,
    pub title: String,
    pub year: String,
    pub resolution: Resolution,
    pub stroke_count: usize,
    pub dominant_color: Rgb8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Keys this crate does not interpret, kept as found.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stroke as stored. Entries that do not parse as a [`Stroke`] are kept
/// verbatim.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum StrokeEntry {
    Stroke(Stroke),
    Legacy(Value),
}

impl StrokeEntry {
    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Self::Stroke(s) => Some(s),
            Self::Legacy(_) => None,
        }
    }
}

/// A pareidolia hit in UV space: centre `(x, y)` with y pointing up, size
/// `(w, h)` as fractions of the image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ghost {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArtifactRecord {
    pub meta: ArtifactMeta,
    pub strokes: Vec<StrokeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pareidolia: Option<Vec<Ghost>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtifactRecord {
    /// Migrate a raw value and parse it.
    pub fn from_value(value: Value, id: &str) -> VoidResult<Self> {
        let migrated = migrate_record(value, id)?;
        serde_json::from_value(migrated)
            .map_err(|e| VoidError::schema(format!("record '{id}': {e}")))
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Strokes that parsed into the current shape.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> + '_ {
        self.strokes.iter().filter_map(StrokeEntry::as_stroke)
    }

    pub fn ghost_count(&self) -> usize {
        self.pareidolia.as_ref().map_or(0, Vec::len)
    }

    /// True when the record has at least one ghost.
    pub fn has_face(&self) -> bool {
        self.ghost_count() > 0
    }
}

fn default_resolution() -> Resolution {
    DEFAULT_RESOLUTION.into()
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestNode {
    pub id: String,
    /// Record file name inside the data directory.
    pub file: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_resolution")]
    pub res: Resolution,
    #[serde(default)]
    pub color: Rgb8,
    #[serde(default)]
    pub strokes: usize,
    /// Ghost count.
    #[serde(default)]
    pub regions: usize,
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestRecord {
    pub generated_at: String,
    pub total_nodes: usize,
    pub nodes: Vec<ManifestNode>,
}

impl ManifestRecord {
    /// Migrate a raw value and parse it.
    pub fn from_value(value: Value) -> VoidResult<Self> {
        let migrated = migrate_manifest(value)?;
        serde_json::from_value(migrated).map_err(|e| VoidError::schema(format!("manifest: {e}")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/schema/records.rs"]
mod tests;
