//! Narrow capability interfaces over the external models.
//!
//! Everything the pipeline needs from a pretrained model sits behind one of
//! four traits so extraction and graph building can run against
//! deterministic fakes. The built-in implementations are model-free
//! heuristics that keep the CLI usable without any weights.

pub mod builtin;
pub mod timeout;

use std::{sync::Arc, time::Duration};

use image::RgbImage;

use crate::{
    config::{DepthKind, OracleConfig, SegmentationKind},
    foundation::error::VoidResult,
    raster::mask::Mask,
};

/// Why an oracle call produced nothing usable.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// No oracle of this kind is configured.
    #[error("oracle unavailable")]
    Unavailable,
    /// The oracle ran and reported a failure.
    #[error("oracle failed: {0}")]
    Failed(String),
    /// The call did not return within the configured limit.
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

pub type OracleResult<T> = Result<T, OracleError>;

/// Image → per-pixel relative depth (row-major, one sample per pixel, smaller is nearer).
///
/// Values are unnormalized; the pipeline rescales them into a [`crate::DepthMap`].
pub trait DepthOracle: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate_depth(&self, image: &RgbImage) -> OracleResult<Vec<f32>>;
}

/// Image → candidate region masks with quality scores.
pub trait SegmentationOracle: Send + Sync {
    fn name(&self) -> &'static str;
    fn segment(&self, image: &RgbImage) -> OracleResult<Vec<Mask>>;
}

/// Image patch → descriptor vector.
pub trait EmbeddingOracle: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract_embedding(&self, patch: &RgbImage) -> OracleResult<Vec<f32>>;
}

/// Image patch → "does this look like a face".
pub trait SalienceDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect_salient_region(&self, patch: &RgbImage) -> bool;
}

/// The oracles loaded for one worker. Read-only after construction.
#[derive(Clone, Default)]
pub struct OracleSet {
    pub depth: Option<Arc<dyn DepthOracle>>,
    pub segmentation: Option<Arc<dyn SegmentationOracle>>,
    pub embedding: Option<Arc<dyn EmbeddingOracle>>,
    pub salience: Option<Arc<dyn SalienceDetector>>,
    /// Applied to depth and segmentation calls.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for OracleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSet")
            .field("depth", &self.depth.as_ref().map(|o| o.name()))
            .field("segmentation", &self.segmentation.as_ref().map(|o| o.name()))
            .field("embedding", &self.embedding.as_ref().map(|o| o.name()))
            .field("salience", &self.salience.as_ref().map(|o| o.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OracleSet {
    /// Instantiate the built-in oracles named by `cfg`.
    pub fn from_config(cfg: &OracleConfig) -> VoidResult<Self> {
        let depth: Option<Arc<dyn DepthOracle>> = match cfg.depth {
            DepthKind::Luminance => Some(Arc::new(builtin::LuminanceDepth::default())),
            DepthKind::Flat => Some(Arc::new(builtin::FlatDepth)),
            DepthKind::None => None,
        };
        let segmentation: Option<Arc<dyn SegmentationOracle>> = match cfg.segmentation {
            SegmentationKind::Regions => Some(Arc::new(builtin::RegionSegmenter::new(
                cfg.region_levels,
                cfg.min_region_area,
                cfg.max_regions,
            )?)),
            SegmentationKind::Grid => Some(Arc::new(builtin::GridSegmenter::new(cfg.grid_tile)?)),
            SegmentationKind::None => None,
        };
        let embedding: Option<Arc<dyn EmbeddingOracle>> = cfg
            .embedding
            .then(|| Arc::new(builtin::HistogramEmbedding::default()) as Arc<dyn EmbeddingOracle>);
        let salience: Option<Arc<dyn SalienceDetector>> = cfg.salience.then(|| {
            Arc::new(builtin::ContrastFaceDetector::new(cfg.face_contrast))
                as Arc<dyn SalienceDetector>
        });

        Ok(Self {
            depth,
            segmentation,
            embedding,
            salience,
            timeout: cfg.timeout_ms.map(Duration::from_millis),
        })
    }

    /// Raw depth for `image`, honouring the configured timeout.
    pub fn estimate_depth(&self, image: &Arc<RgbImage>) -> OracleResult<Vec<f32>> {
        let oracle = self.depth.clone().ok_or(OracleError::Unavailable)?;
        let image = Arc::clone(image);
        timeout::call_with_timeout(self.timeout, move || oracle.estimate_depth(&image))
    }

    /// Masks for `image`, honouring the configured timeout.
    pub fn segment(&self, image: &Arc<RgbImage>) -> OracleResult<Vec<Mask>> {
        let oracle = self.segmentation.clone().ok_or(OracleError::Unavailable)?;
        let image = Arc::clone(image);
        timeout::call_with_timeout(self.timeout, move || oracle.segment(&image))
    }
}
