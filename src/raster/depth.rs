use crate::{
    foundation::core::Resolution,
    foundation::error::{VoidError, VoidResult},
    raster::mask::Footprint,
};

/// Per-pixel relative depth, normalized to `[0, 1]` (0 = nearest).
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    res: Resolution,
    values: Vec<f32>,
}

impl DepthMap {
    /// Ranges at or below this width are treated as degenerate.
    pub const EPSILON: f32 = 1e-6;

    /// Normalize raw oracle output: min maps to 0, max to 1.
    ///
    /// A degenerate range (`max - min <= EPSILON`) yields an all-zero map.
    /// Non-finite samples are ignored when computing the range and map to 0.
    pub fn normalized(res: Resolution, raw: Vec<f32>) -> VoidResult<Self> {
        if raw.len() != res.pixel_count() {
            return Err(VoidError::validation(format!(
                "depth map has {} samples, expected {}x{}",
                raw.len(),
                res.width,
                res.height
            )));
        }

        // f64 so the span of samples near ±f32::MAX stays finite.
        let (min, max) = raw
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .map(f64::from)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        let span = max - min;
        if !span.is_finite() || span <= f64::from(Self::EPSILON) {
            return Ok(Self::flat(res));
        }

        let mut values = raw;
        for v in &mut values {
            *v = if v.is_finite() {
                ((f64::from(*v) - min) / span).clamp(0.0, 1.0) as f32
            } else {
                0.0
            };
        }
        Ok(Self { res, values })
    }

    /// Degenerate substitute used when no depth estimate is available.
    pub fn flat(res: Resolution) -> Self {
        Self {
            res,
            values: vec![0.0; res.pixel_count()],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.res
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.res.width as usize + x as usize]
    }

    /// Mean depth over a footprint's member pixels.
    pub fn mean_over(&self, fp: &Footprint) -> Option<f32> {
        let mut sum = 0.0f64;
        let mut n = 0u64;
        for (x, y) in fp.pixels() {
            sum += f64::from(self.get(x, y));
            n += 1;
        }
        (n > 0).then(|| (sum / n as f64) as f32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/depth.rs"]
mod tests;
