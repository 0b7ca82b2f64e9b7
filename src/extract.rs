//! Layered stroke extraction.
//!
//! Masks are visited nearest first. Each one samples its colour from a
//! working canvas and then heals its footprint out of that canvas, so the
//! strokes behind it see what was occluded instead of the foreground.

use image::RgbImage;

use crate::{
    foundation::core::{BBox, Resolution, Rgb8},
    foundation::error::{VoidError, VoidResult},
    oracle::{EmbeddingOracle, SalienceDetector},
    raster::{
        depth::DepthMap,
        heal::heal,
        mask::{Footprint, Mask},
    },
};

/// One extracted region. Immutable once emitted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub color: Rgb8,
    pub bbox: BBox,
    /// Mean normalized depth over the footprint, 0 = nearest.
    #[serde(rename = "z")]
    pub depth: f32,
    pub stability: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<bool>,
}

#[derive(Clone, Copy, Debug)]
pub struct StrokeExtractor {
    /// Extra pixels healed around every footprint.
    pub heal_dilation: u32,
}

impl Default for StrokeExtractor {
    fn default() -> Self {
        Self { heal_dilation: 2 }
    }
}

struct Layer {
    footprint: Footprint,
    depth: f32,
    stability: f32,
}

impl StrokeExtractor {
    pub fn new(heal_dilation: u32) -> Self {
        Self { heal_dilation }
    }

    /// Turn masks into occlusion-ordered strokes.
    ///
    /// Masks that clip to nothing are dropped. Ties in depth keep mask order.
    #[tracing::instrument(skip_all, fields(masks = masks.len()))]
    pub fn extract(
        &self,
        image: &RgbImage,
        depth: &DepthMap,
        masks: &[Mask],
    ) -> VoidResult<Vec<Stroke>> {
        let res = Resolution::new(image.width(), image.height());
        if depth.resolution() != res {
            return Err(VoidError::validation(format!(
                "depth map is {}x{}, image is {}x{}",
                depth.resolution().width,
                depth.resolution().height,
                res.width,
                res.height
            )));
        }

        let mut layers: Vec<Layer> = masks
            .iter()
            .filter_map(|m| {
                let footprint = m.resolve(res)?;
                let depth = depth.mean_over(&footprint)?;
                Some(Layer {
                    footprint,
                    depth,
                    stability: m.stability,
                })
            })
            .collect();
        let dropped = masks.len() - layers.len();
        if dropped > 0 {
            tracing::debug!(dropped, "masks clipped to nothing");
        }
        layers.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let mut canvas = image.clone();
        let mut strokes = Vec::with_capacity(layers.len());
        for layer in &layers {
            strokes.push(Stroke {
                color: mean_color(&canvas, &layer.footprint),
                bbox: layer.footprint.bbox(),
                depth: layer.depth.clamp(0.0, 1.0),
                stability: if layer.stability.is_finite() {
                    layer.stability.clamp(0.0, 1.0)
                } else {
                    0.0
                },
                embedding: None,
                face: None,
            });
            heal(&mut canvas, &layer.footprint, self.heal_dilation);
        }
        Ok(strokes)
    }
}

/// Truncated mean colour of the footprint's pixels.
fn mean_color(canvas: &RgbImage, fp: &Footprint) -> Rgb8 {
    let mut acc = [0u64; 3];
    for (x, y) in fp.pixels() {
        let p = canvas.get_pixel(x, y).0;
        for c in 0..3 {
            acc[c] += u64::from(p[c]);
        }
    }
    let n = fp.count().max(1) as u64;
    acc.map(|v| (v / n) as u8)
}

/// Attach an embedding and a face flag to each stroke, sampled from the
/// source image under the stroke's bbox.
///
/// A failing embedding call leaves that stroke without one. Returns how many
/// strokes received an embedding.
pub fn annotate_strokes(
    strokes: &mut [Stroke],
    image: &RgbImage,
    embedding: Option<&dyn EmbeddingOracle>,
    salience: Option<&dyn SalienceDetector>,
) -> usize {
    let res = Resolution::new(image.width(), image.height());
    let mut embedded = 0;
    for s in strokes.iter_mut().filter(|s| res.contains(s.bbox)) {
        let b = s.bbox;
        let patch = image::imageops::crop_imm(image, b.x, b.y, b.w, b.h).to_image();
        if let Some(oracle) = embedding {
            match oracle.extract_embedding(&patch) {
                Ok(v) => {
                    s.embedding = Some(v);
                    embedded += 1;
                }
                Err(e) => tracing::debug!(oracle = oracle.name(), error = %e, "stroke embedding"),
            }
        }
        if let Some(det) = salience {
            s.face = Some(det.detect_salient_region(&patch));
        }
    }
    embedded
}

/// Mean colour of the first 100 strokes, truncated; `None` without strokes.
pub fn dominant_color<I>(colors: I) -> Option<Rgb8>
where
    I: IntoIterator<Item = Rgb8>,
{
    let mut acc = [0u64; 3];
    let mut n = 0u64;
    for c in colors.into_iter().take(DOMINANT_SAMPLE) {
        for i in 0..3 {
            acc[i] += u64::from(c[i]);
        }
        n += 1;
    }
    (n > 0).then(|| acc.map(|v| (v / n) as u8))
}

/// Strokes considered when deriving an artifact's dominant colour.
pub const DOMINANT_SAMPLE: usize = 100;

#[cfg(test)]
#[path = "../tests/unit/extract.rs"]
mod tests;
