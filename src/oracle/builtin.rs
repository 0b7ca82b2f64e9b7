use image::RgbImage;

use crate::{
    foundation::core::{Resolution, luma},
    foundation::error::{VoidError, VoidResult},
    oracle::{
        DepthOracle, EmbeddingOracle, OracleError, OracleResult, SalienceDetector,
        SegmentationOracle,
    },
    raster::mask::{Mask, grid_masks},
};

fn resolution_of(image: &RgbImage) -> Resolution {
    Resolution::new(image.width(), image.height())
}

/// Constant depth; the range is degenerate so it normalizes to all zeros.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatDepth;

impl DepthOracle for FlatDepth {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn estimate_depth(&self, image: &RgbImage) -> OracleResult<Vec<f32>> {
        Ok(vec![0.5; resolution_of(image).pixel_count()])
    }
}

/// Monocular cue blend: brighter pixels and pixels lower in frame read as nearer.
#[derive(Clone, Copy, Debug)]
pub struct LuminanceDepth {
    /// Weight of the brightness cue; the vertical cue gets the remainder.
    pub luma_weight: f32,
}

impl Default for LuminanceDepth {
    fn default() -> Self {
        Self { luma_weight: 0.6 }
    }
}

impl DepthOracle for LuminanceDepth {
    fn name(&self) -> &'static str {
        "luminance"
    }

    fn estimate_depth(&self, image: &RgbImage) -> OracleResult<Vec<f32>> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(OracleError::failed("empty image"));
        }
        let lw = self.luma_weight.clamp(0.0, 1.0);
        let denom = (h.max(2) - 1) as f32;
        let mut out = Vec::with_capacity(w as usize * h as usize);
        for (_, y, px) in image.enumerate_pixels() {
            let far_by_luma = 1.0 - luma(px.0) / 255.0;
            let far_by_height = 1.0 - y as f32 / denom;
            out.push(lw * far_by_luma + (1.0 - lw) * far_by_height);
        }
        Ok(out)
    }
}

/// Degenerate segmentation: fixed-size tiles.
#[derive(Clone, Copy, Debug)]
pub struct GridSegmenter {
    tile: u32,
}

impl GridSegmenter {
    pub fn new(tile: u32) -> VoidResult<Self> {
        if tile == 0 {
            return Err(VoidError::validation("grid tile size must be > 0"));
        }
        Ok(Self { tile })
    }
}

impl SegmentationOracle for GridSegmenter {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn segment(&self, image: &RgbImage) -> OracleResult<Vec<Mask>> {
        Ok(grid_masks(resolution_of(image), self.tile))
    }
}

/// Connected components over a posterized image.
///
/// Each channel is quantized to `levels` buckets; 4-connected runs of the
/// same bucket triple form one region. Regions smaller than `min_area` are
/// dropped and at most `max_regions` of the largest are kept. Stability is
/// one minus the region's normalized luma spread.
#[derive(Clone, Copy, Debug)]
pub struct RegionSegmenter {
    levels: u8,
    min_area: u64,
    max_regions: usize,
}

impl RegionSegmenter {
    pub fn new(levels: u8, min_area: u64, max_regions: usize) -> VoidResult<Self> {
        if levels < 2 {
            return Err(VoidError::validation("region levels must be >= 2"));
        }
        if max_regions == 0 {
            return Err(VoidError::validation("max_regions must be > 0"));
        }
        Ok(Self {
            levels,
            min_area,
            max_regions,
        })
    }

    fn bucket(&self, px: [u8; 3]) -> u32 {
        let l = u32::from(self.levels);
        let q = |c: u8| u32::from(c) * l / 256;
        (q(px[0]) * l + q(px[1])) * l + q(px[2])
    }
}

impl SegmentationOracle for RegionSegmenter {
    fn name(&self) -> &'static str {
        "regions"
    }

    fn segment(&self, image: &RgbImage) -> OracleResult<Vec<Mask>> {
        let res = resolution_of(image);
        let (w, h) = (res.width as usize, res.height as usize);
        let buckets: Vec<u32> = image.pixels().map(|p| self.bucket(p.0)).collect();

        let mut label = vec![u32::MAX; w * h];
        let mut regions: Vec<(Vec<usize>, f32)> = Vec::new();
        let mut stack = Vec::new();

        for seed in 0..w * h {
            if label[seed] != u32::MAX {
                continue;
            }
            let id = regions.len() as u32;
            let b = buckets[seed];
            let mut members = Vec::new();
            let (mut sum, mut sum_sq) = (0.0f64, 0.0f64);

            label[seed] = id;
            stack.push(seed);
            while let Some(i) = stack.pop() {
                members.push(i);
                let p = &image.as_raw()[i * 3..i * 3 + 3];
                let l = f64::from(luma([p[0], p[1], p[2]]));
                sum += l;
                sum_sq += l * l;

                let (x, y) = (i % w, i / w);
                let mut visit = |j: usize| {
                    if label[j] == u32::MAX && buckets[j] == b {
                        label[j] = id;
                        stack.push(j);
                    }
                };
                if x > 0 {
                    visit(i - 1);
                }
                if x + 1 < w {
                    visit(i + 1);
                }
                if y > 0 {
                    visit(i - w);
                }
                if y + 1 < h {
                    visit(i + w);
                }
            }

            let n = members.len() as f64;
            let var = (sum_sq / n - (sum / n).powi(2)).max(0.0);
            let stability = (1.0 - var.sqrt() / 128.0).clamp(0.0, 1.0) as f32;
            regions.push((members, stability));
        }

        let mut kept: Vec<(Vec<usize>, f32)> = regions
            .into_iter()
            .filter(|(m, _)| m.len() as u64 >= self.min_area)
            .collect();
        kept.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        kept.truncate(self.max_regions);

        Ok(kept
            .into_iter()
            .filter_map(|(members, stability)| Mask::from_pixel_indices(res, &members, stability))
            .collect())
    }
}

/// Joint RGB histogram, `bins` buckets per channel, L1-normalized.
#[derive(Clone, Copy, Debug)]
pub struct HistogramEmbedding {
    pub bins: u8,
}

impl Default for HistogramEmbedding {
    fn default() -> Self {
        Self { bins: 4 }
    }
}

impl EmbeddingOracle for HistogramEmbedding {
    fn name(&self) -> &'static str {
        "histogram"
    }

    fn extract_embedding(&self, patch: &RgbImage) -> OracleResult<Vec<f32>> {
        let bins = u32::from(self.bins.max(1));
        let n = patch.width() as usize * patch.height() as usize;
        if n == 0 {
            return Err(OracleError::failed("empty patch"));
        }
        let mut hist = vec![0.0f32; (bins * bins * bins) as usize];
        for p in patch.pixels() {
            let q = |c: u8| u32::from(c) * bins / 256;
            hist[((q(p.0[0]) * bins + q(p.0[1])) * bins + q(p.0[2])) as usize] += 1.0;
        }
        for v in &mut hist {
            *v /= n as f32;
        }
        Ok(hist)
    }
}

/// Deliberately loose face pattern: two dark "eyes" flanking a brighter
/// bridge, and a "mouth" darker than the "nose".
///
/// The patch is split into a 3x3 grid of cells and compared by mean luma.
/// Tuned to hallucinate, not to find real faces.
#[derive(Clone, Copy, Debug)]
pub struct ContrastFaceDetector {
    /// Minimum luma gap (0..255) between eyes and bridge.
    pub contrast: f32,
}

impl ContrastFaceDetector {
    pub fn new(contrast: f32) -> Self {
        Self { contrast }
    }
}

impl SalienceDetector for ContrastFaceDetector {
    fn name(&self) -> &'static str {
        "contrast-face"
    }

    fn detect_salient_region(&self, patch: &RgbImage) -> bool {
        let (w, h) = patch.dimensions();
        if w < 3 || h < 3 {
            return false;
        }
        let mut cells = [[0.0f32; 3]; 3];
        let mut counts = [[0u32; 3]; 3];
        for (x, y, p) in patch.enumerate_pixels() {
            let (cx, cy) = ((x * 3 / w) as usize, (y * 3 / h) as usize);
            cells[cy][cx] += luma(p.0);
            counts[cy][cx] += 1;
        }
        for cy in 0..3 {
            for cx in 0..3 {
                cells[cy][cx] /= counts[cy][cx].max(1) as f32;
            }
        }

        let bridge = cells[0][1];
        let eyes = cells[0][0] + self.contrast < bridge && cells[0][2] + self.contrast < bridge;
        let mouth = cells[2][1] < cells[1][1];
        eyes && mouth
    }
}

#[cfg(test)]
#[path = "../../tests/unit/oracle/builtin.rs"]
mod tests;
