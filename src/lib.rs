//! voidgrind turns flat artworks into "exploded" clouds of 3D paint strokes
//! and links many of them into a navigable similarity graph.
//!
//! # Pipeline overview
//!
//! 1. **Grind**: `image -> depth + masks -> Stroke[]` via layered extraction
//!    with canvas healing, one artifact record per source image
//! 2. **Scan**: optional pareidolia pass storing face-like "ghost" regions
//! 3. **Index**: `records -> manifest` with top-K colour neighbours
//! 4. **Graph**: `records -> graph` by cosine similarity, boosting non-face to face links
//! 5. **Project**: `record -> cloud` by inverse pinhole unprojection
//!
//! Model-backed capabilities (depth, segmentation, embeddings, salience) sit
//! behind the traits in [`DepthOracle`] and friends; the built-in
//! implementations are deterministic heuristics.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Sequential per artifact**: horizontal scale comes from shards, see [`ShardSpec`].
//! - **Whole-file writes**: records are replaced atomically and never edited in place.
#![forbid(unsafe_code)]

mod config;
mod extract;
mod foundation;
mod graph;
mod oracle;
mod pipeline;
mod project;
mod raster;
mod schema;
mod shard;

pub use config::{
    CameraConfig, DepthKind, GhostConfig, GraphConfig, GrindConfig, OracleConfig, PathsConfig,
    SegmentationKind, VoidConfig,
};
pub use extract::{DOMINANT_SAMPLE, Stroke, StrokeExtractor, annotate_strokes, dominant_color};
pub use foundation::core::{BBox, PixelRect, Resolution, Rgb8, luma};
pub use foundation::error::{VoidError, VoidResult};
pub use foundation::math::{Fnv1a64, Rng64, fnv1a64_str};
pub use graph::{
    Descriptor, Edge, EdgeCandidate, EdgeKind, GraphBuilder, GraphNode, GraphRecord, color_distance,
    cosine, nearest_neighbors, normalized,
};
pub use oracle::builtin::{
    ContrastFaceDetector, FlatDepth, GridSegmenter, HistogramEmbedding, LuminanceDepth,
    RegionSegmenter,
};
pub use oracle::timeout::call_with_timeout;
pub use oracle::{
    DepthOracle, EmbeddingOracle, OracleError, OracleResult, OracleSet, SalienceDetector,
    SegmentationOracle,
};
pub use pipeline::grind::Fallbacks;
pub use pipeline::store::{list_records, load_record, read_json, record_path, write_json_atomic};
pub use pipeline::{
    ArtifactFailure, ArtifactOutcome, BatchReport, GhostScanner, Grinder, IndexReport,
    MigrateReport, ScanReport, build_graph, build_manifest, export_cloud, migrate_all,
    scan_records,
};
pub use project::{CloudRecord, Placement, Projector, WorldStroke, build_cloud};
pub use raster::decode::{SOURCE_EXTENSIONS, cap_dimension, is_source_image, load_rgb};
pub use raster::depth::DepthMap;
pub use raster::heal::heal;
pub use raster::mask::{Footprint, Mask, grid_masks};
pub use schema::migrate::year_and_title;
pub use schema::{
    ArtifactMeta, ArtifactRecord, CURRENT_SCHEMA, DEFAULT_RESOLUTION, DEFAULT_YEAR, Ghost,
    ManifestNode, ManifestRecord, SchemaVersion, StrokeEntry, detect_version, migrate_manifest,
    migrate_record,
};
pub use shard::{ShardSpec, ShardStrategy, belongs_to_shard};
