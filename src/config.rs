use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    foundation::error::{VoidError, VoidResult},
    shard::ShardStrategy,
};

/// Every tunable of a run, constructed once and threaded through the stages.
///
/// All fields have serde defaults, so a config file only needs the keys it
/// overrides.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VoidConfig {
    pub paths: PathsConfig,
    pub grind: GrindConfig,
    pub oracles: OracleConfig,
    pub ghosts: GhostConfig,
    pub graph: GraphConfig,
    pub camera: CameraConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source artwork directory.
    pub raw_dir: PathBuf,
    /// One record per artifact lands here.
    pub data_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub graph_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("assets/raw"),
            data_dir: PathBuf::from("public/data"),
            manifest_path: PathBuf::from("public/manifest.json"),
            graph_path: PathBuf::from("public/graph.json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GrindConfig {
    /// Sources narrower or shorter than this are rejected.
    pub min_resolution: u32,
    /// Longer side cap applied before extraction.
    pub max_dimension: u32,
    /// Tile size of the fallback grid masks.
    pub grid_tile: u32,
    /// Extra pixels healed around each extracted footprint.
    pub heal_dilation: u32,
    /// Remove rejected sources from disk.
    pub delete_rejected: bool,
    /// Attach an embedding and face flag to every stroke.
    pub annotate_strokes: bool,
    /// Run the pareidolia scan while grinding.
    pub scan_ghosts: bool,
    /// Partitioning of the input list across `--total` workers.
    pub shard_strategy: ShardStrategy,
}

impl Default for GrindConfig {
    fn default() -> Self {
        Self {
            min_resolution: 1080,
            max_dimension: 1500,
            grid_tile: 64,
            heal_dilation: 2,
            delete_rejected: true,
            annotate_strokes: false,
            scan_ghosts: true,
            shard_strategy: ShardStrategy::RoundRobin,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthKind {
    #[default]
    Luminance,
    Flat,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationKind {
    #[default]
    Regions,
    Grid,
    None,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub depth: DepthKind,
    pub segmentation: SegmentationKind,
    pub embedding: bool,
    pub salience: bool,
    /// Per-call limit for depth and segmentation; `None` waits forever.
    pub timeout_ms: Option<u64>,
    /// Posterization levels per channel for region segmentation.
    pub region_levels: u8,
    pub min_region_area: u64,
    pub max_regions: usize,
    /// Tile size when `segmentation` is `grid`.
    pub grid_tile: u32,
    /// Eye/bridge luma gap for the face detector.
    pub face_contrast: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            depth: DepthKind::Luminance,
            segmentation: SegmentationKind::Regions,
            embedding: true,
            salience: true,
            timeout_ms: Some(120_000),
            region_levels: 6,
            min_region_area: 100,
            max_regions: 768,
            grid_tile: 64,
            face_contrast: 12.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GhostConfig {
    /// Smallest scanned window side in pixels.
    pub min_size: u32,
    /// Window growth factor between scales.
    pub scale_step: f32,
    /// Window stride as a fraction of the window side.
    pub stride_fraction: f32,
    /// A detection covering more than this fraction of a kept, larger one
    /// (measured on the smaller window) is dropped.
    pub merge_overlap: f32,
    pub confidence: f32,
    pub max_ghosts: usize,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            min_size: 30,
            scale_step: 1.25,
            stride_fraction: 0.5,
            merge_overlap: 0.3,
            confidence: 0.8,
            max_ghosts: 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cosine similarity an edge must exceed.
    pub threshold: f64,
    /// Raw score a non-face → face pair must exceed to be boosted.
    pub pareidolia_floor: f64,
    pub pareidolia_boost: f64,
    /// Navigation neighbours per manifest node.
    pub neighbors: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            pareidolia_floor: 0.7,
            pareidolia_boost: 0.2,
            neighbors: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    /// World depth of a stroke with normalized depth 0.
    pub near: f64,
    /// World depth added per unit of normalized depth.
    pub depth_range: f64,
    /// Seed of the per-stroke rotation stream.
    pub seed: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 1.0,
            depth_range: 4.0,
            seed: 1,
        }
    }
}

impl VoidConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn from_path(path: &Path) -> VoidResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| VoidError::serde(format!("parse config '{}': {e}", path.display())))?;
        Ok(cfg)
    }

    /// Reject settings no stage can work with.
    pub fn validate(&self) -> VoidResult<()> {
        let g = &self.grind;
        if g.grid_tile == 0 || self.oracles.grid_tile == 0 {
            return Err(VoidError::validation("grid tile size must be > 0"));
        }
        if self.oracles.region_levels < 2 {
            return Err(VoidError::validation("region_levels must be >= 2"));
        }
        if self.oracles.max_regions == 0 {
            return Err(VoidError::validation("max_regions must be > 0"));
        }
        if self.oracles.timeout_ms == Some(0) {
            return Err(VoidError::validation("timeout_ms must be > 0 when set"));
        }

        let gh = &self.ghosts;
        if gh.min_size < 3 {
            return Err(VoidError::validation("ghost min_size must be >= 3"));
        }
        if !(gh.scale_step > 1.0) {
            return Err(VoidError::validation("ghost scale_step must be > 1"));
        }
        if !(gh.stride_fraction > 0.0 && gh.stride_fraction <= 1.0) {
            return Err(VoidError::validation("ghost stride_fraction must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&gh.confidence) {
            return Err(VoidError::validation("ghost confidence must be in [0, 1]"));
        }

        let gr = &self.graph;
        if !gr.threshold.is_finite() || !gr.pareidolia_floor.is_finite() {
            return Err(VoidError::validation("graph thresholds must be finite"));
        }
        if !(gr.pareidolia_boost >= 0.0) {
            return Err(VoidError::validation("pareidolia_boost must be >= 0"));
        }

        let c = &self.camera;
        if !(c.fov_deg > 0.0 && c.fov_deg < 180.0) {
            return Err(VoidError::validation("fov_deg must be in (0, 180)"));
        }
        if !(c.near >= 0.0) || !(c.depth_range >= 0.0) {
            return Err(VoidError::validation("camera near/depth_range must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
