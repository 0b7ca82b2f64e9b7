use crate::foundation::error::{VoidError, VoidResult};

/// Straight (non-premultiplied) RGB colour, one byte per channel.
pub type Rgb8 = [u8; 3];

/// Pixel dimensions of an image. Serialized as `[width, height]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when `bbox` lies fully inside `[0, width) x [0, height)`.
    pub fn contains(self, bbox: BBox) -> bool {
        u64::from(bbox.x) + u64::from(bbox.w) <= u64::from(self.width)
            && u64::from(bbox.y) + u64::from(bbox.h) <= u64::from(self.height)
    }
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for [u32; 2] {
    fn from(r: Resolution) -> Self {
        [r.width, r.height]
    }
}

/// Validated integer bounding box with positive extent. Serialized as `[x, y, w, h]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[u32; 4]", into = "[u32; 4]")]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32, // > 0
    pub h: u32, // > 0
}

impl BBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> VoidResult<Self> {
        if w == 0 || h == 0 {
            return Err(VoidError::validation("BBox width and height must be > 0"));
        }
        Ok(Self { x, y, w, h })
    }

    /// Pixel-space centre `(u, v)`.
    pub fn center(self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.w) / 2.0,
            f64::from(self.y) + f64::from(self.h) / 2.0,
        )
    }

    pub fn area(self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Grow by `r` pixels on every side, clipped to `res`.
    pub fn dilate(self, r: u32, res: Resolution) -> Self {
        let x0 = self.x.saturating_sub(r);
        let y0 = self.y.saturating_sub(r);
        let x1 = (self.x + self.w).saturating_add(r).min(res.width);
        let y1 = (self.y + self.h).saturating_add(r).min(res.height);
        Self {
            x: x0,
            y: y0,
            w: x1.saturating_sub(x0).max(1),
            h: y1.saturating_sub(y0).max(1),
        }
    }

    pub fn to_array(self) -> [u32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

impl TryFrom<[u32; 4]> for BBox {
    type Error = VoidError;

    fn try_from([x, y, w, h]: [u32; 4]) -> VoidResult<Self> {
        Self::new(x, y, w, h)
    }
}

impl From<BBox> for [u32; 4] {
    fn from(b: BBox) -> Self {
        b.to_array()
    }
}

/// Unvalidated rectangle as reported by an oracle; may be empty, negative or out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Intersect with the image bounds. `None` when nothing positive remains.
    pub fn clip_to(self, res: Resolution) -> Option<BBox> {
        if self.w <= 0 || self.h <= 0 {
            return None;
        }
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.x.saturating_add(self.w).min(i64::from(res.width));
        let y1 = self.y.saturating_add(self.h).min(i64::from(res.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BBox {
            x: x0 as u32,
            y: y0 as u32,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        })
    }
}

impl From<BBox> for PixelRect {
    fn from(b: BBox) -> Self {
        Self {
            x: i64::from(b.x),
            y: i64::from(b.y),
            w: i64::from(b.w),
            h: i64::from(b.h),
        }
    }
}

/// Rec. 601 luma of an RGB triple, in `[0, 255]`.
pub fn luma(px: Rgb8) -> f32 {
    0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2])
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
