use crate::foundation::core::{BBox, PixelRect, Resolution};

/// A candidate region reported by a segmentation oracle.
///
/// Membership is either the full rectangle or a bitmap local to `rect`
/// (row-major, `rect.w * rect.h` entries).
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub rect: PixelRect,
    pub bits: Option<Vec<bool>>,
    /// Oracle quality score, clamped into `[0, 1]` when a stroke is emitted.
    pub stability: f32,
}

impl Mask {
    /// Rectangle-only membership.
    pub fn from_rect(rect: PixelRect, stability: f32) -> Self {
        Self {
            rect,
            bits: None,
            stability,
        }
    }

    /// Build from a full-image membership bitmap; the rect is the tight bounds.
    ///
    /// Returns `None` when the bitmap has no member pixels or the wrong length.
    pub fn from_image_bitmap(res: Resolution, bits: &[bool], stability: f32) -> Option<Self> {
        if bits.len() != res.pixel_count() {
            return None;
        }
        let w = res.width as usize;
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0usize, 0usize);
        for (i, _) in bits.iter().enumerate().filter(|(_, b)| **b) {
            let (x, y) = (i % w, i / w);
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        if x0 == usize::MAX {
            return None;
        }

        let (bw, bh) = (x1 - x0 + 1, y1 - y0 + 1);
        let mut local = Vec::with_capacity(bw * bh);
        for y in y0..=y1 {
            local.extend_from_slice(&bits[y * w + x0..=y * w + x1]);
        }
        Some(Self {
            rect: PixelRect::new(x0 as i64, y0 as i64, bw as i64, bh as i64),
            bits: Some(local),
            stability,
        })
    }

    /// Build from row-major pixel indices into a `res`-sized image.
    ///
    /// Out-of-range indices are ignored; `None` when nothing remains.
    pub fn from_pixel_indices(res: Resolution, indices: &[usize], stability: f32) -> Option<Self> {
        let w = res.width as usize;
        let valid = || indices.iter().copied().filter(|&i| i < res.pixel_count());
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0usize, 0usize);
        for i in valid() {
            let (x, y) = (i % w, i / w);
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        if x0 == usize::MAX {
            return None;
        }

        let bw = x1 - x0 + 1;
        let mut local = vec![false; bw * (y1 - y0 + 1)];
        for i in valid() {
            local[(i / w - y0) * bw + (i % w - x0)] = true;
        }
        Some(Self {
            rect: PixelRect::new(x0 as i64, y0 as i64, bw as i64, (y1 - y0 + 1) as i64),
            bits: Some(local),
            stability,
        })
    }

    /// Number of member pixels before clipping.
    pub fn area(&self) -> u64 {
        match &self.bits {
            Some(bits) => bits.iter().filter(|b| **b).count() as u64,
            None => (self.rect.w.max(0) as u64) * (self.rect.h.max(0) as u64),
        }
    }

    /// Clip against the image and materialize membership.
    ///
    /// `None` for non-positive extents, malformed bitmaps, or empty membership.
    pub fn resolve(&self, res: Resolution) -> Option<Footprint> {
        let clipped = self.rect.clip_to(res)?;
        let (cw, ch) = (clipped.w as usize, clipped.h as usize);
        let bits = match &self.bits {
            None => vec![true; cw * ch],
            Some(src) => {
                let (sw, sh) = (self.rect.w as usize, self.rect.h as usize);
                if src.len() != sw * sh {
                    return None;
                }
                let ox = (i64::from(clipped.x) - self.rect.x) as usize;
                let oy = (i64::from(clipped.y) - self.rect.y) as usize;
                let mut out = Vec::with_capacity(cw * ch);
                for row in 0..ch {
                    let start = (oy + row) * sw + ox;
                    out.extend_from_slice(&src[start..start + cw]);
                }
                out
            }
        };
        Footprint::new(clipped, bits)
    }
}

/// A mask clipped to the image, with bbox-local membership and at least one pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    bbox: BBox,
    bits: Vec<bool>,
    count: usize,
}

impl Footprint {
    pub fn new(bbox: BBox, bits: Vec<bool>) -> Option<Self> {
        if bits.len() != bbox.w as usize * bbox.h as usize {
            return None;
        }
        let count = bits.iter().filter(|b| **b).count();
        (count > 0).then_some(Self { bbox, bits, count })
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        let b = self.bbox;
        if x < b.x || y < b.y || x >= b.x + b.w || y >= b.y + b.h {
            return false;
        }
        self.bits[(y - b.y) as usize * b.w as usize + (x - b.x) as usize]
    }

    /// Absolute image coordinates of member pixels, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let b = self.bbox;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(move |(i, _)| {
                let i = i as u32;
                (b.x + i % b.w, b.y + i / b.w)
            })
    }
}

/// Fixed-size tiling used when segmentation is unavailable.
///
/// Edge tiles are cropped to the image; every tile carries stability 0.5.
pub fn grid_masks(res: Resolution, tile: u32) -> Vec<Mask> {
    let tile = tile.max(1);
    let mut masks = Vec::new();
    for y in (0..res.height).step_by(tile as usize) {
        for x in (0..res.width).step_by(tile as usize) {
            let w = tile.min(res.width - x);
            let h = tile.min(res.height - y);
            masks.push(Mask::from_rect(
                PixelRect::new(i64::from(x), i64::from(y), i64::from(w), i64::from(h)),
                0.5,
            ));
        }
    }
    masks
}

#[cfg(test)]
#[path = "../../tests/unit/raster/mask.rs"]
mod tests;
