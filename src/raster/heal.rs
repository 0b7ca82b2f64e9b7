//! Canvas healing: content-aware fill of an extracted region.
//!
//! The footprint is dilated, then filled layer by layer from its known
//! border (onion peel), each pixel taking the mean of its already-known
//! 8-neighbours. A short smoothing pass over the filled pixels removes the
//! directional streaks the peel leaves behind.

use image::RgbImage;

use crate::{
    foundation::core::{BBox, Resolution},
    raster::mask::Footprint,
};

const SMOOTH_PASSES: usize = 2;

/// Fill `footprint` (grown by `dilation` pixels) in place.
///
/// Pixels outside the dilated footprint are never written. If the dilated
/// footprint covers the whole image there is nothing to propagate from and
/// the canvas is left untouched.
pub fn heal(canvas: &mut RgbImage, footprint: &Footprint, dilation: u32) {
    let res = Resolution::new(canvas.width(), canvas.height());
    let region = footprint.bbox().dilate(dilation.saturating_add(1), res);
    let mut work = Region::load(canvas, region);

    work.mark_unknown(footprint, dilation);
    if work.unknown_count() == 0 || work.unknown_count() == work.len() {
        return;
    }

    let filled = work.onion_peel();
    for _ in 0..SMOOTH_PASSES {
        work.smooth(&filled);
    }
    work.store(canvas, &filled);
}

struct Region {
    bbox: BBox,
    px: Vec<[f32; 3]>,
    known: Vec<bool>,
}

impl Region {
    fn load(canvas: &RgbImage, bbox: BBox) -> Self {
        let mut px = Vec::with_capacity(bbox.area() as usize);
        for y in bbox.y..bbox.y + bbox.h {
            for x in bbox.x..bbox.x + bbox.w {
                let p = canvas.get_pixel(x, y).0;
                px.push([f32::from(p[0]), f32::from(p[1]), f32::from(p[2])]);
            }
        }
        let known = vec![true; px.len()];
        Self { bbox, px, known }
    }

    fn len(&self) -> usize {
        self.px.len()
    }

    fn unknown_count(&self) -> usize {
        self.known.iter().filter(|k| !**k).count()
    }

    fn idx(&self, lx: i64, ly: i64) -> Option<usize> {
        let (w, h) = (i64::from(self.bbox.w), i64::from(self.bbox.h));
        (lx >= 0 && ly >= 0 && lx < w && ly < h).then(|| (ly * w + lx) as usize)
    }

    fn mark_unknown(&mut self, footprint: &Footprint, dilation: u32) {
        let r = i64::from(dilation);
        for (x, y) in footprint.pixels() {
            let lx = i64::from(x) - i64::from(self.bbox.x);
            let ly = i64::from(y) - i64::from(self.bbox.y);
            for dy in -r..=r {
                for dx in -r..=r {
                    if let Some(i) = self.idx(lx + dx, ly + dy) {
                        self.known[i] = false;
                    }
                }
            }
        }
    }

    /// Returns the set of pixels that were filled.
    fn onion_peel(&mut self) -> Vec<bool> {
        let filled: Vec<bool> = self.known.iter().map(|k| !*k).collect();
        let w = i64::from(self.bbox.w);

        loop {
            let mut layer: Vec<(usize, [f32; 3])> = Vec::new();
            for i in (0..self.len()).filter(|&i| !self.known[i]) {
                let (lx, ly) = ((i as i64) % w, (i as i64) / w);
                if let Some(c) = self.mean_of_neighbours(lx, ly, |j| self.known[j]) {
                    layer.push((i, c));
                }
            }
            if layer.is_empty() {
                break;
            }
            for (i, c) in layer {
                self.px[i] = c;
                self.known[i] = true;
            }
        }
        filled
    }

    fn smooth(&mut self, filled: &[bool]) {
        let w = i64::from(self.bbox.w);
        let mut next = self.px.clone();
        for i in (0..self.len()).filter(|&i| filled[i]) {
            let (lx, ly) = ((i as i64) % w, (i as i64) / w);
            if let Some(c) = self.mean_of_neighbours(lx, ly, |_| true) {
                let p = self.px[i];
                next[i] = [
                    (p[0] + c[0]) / 2.0,
                    (p[1] + c[1]) / 2.0,
                    (p[2] + c[2]) / 2.0,
                ];
            }
        }
        self.px = next;
    }

    fn mean_of_neighbours(
        &self,
        lx: i64,
        ly: i64,
        accept: impl Fn(usize) -> bool,
    ) -> Option<[f32; 3]> {
        let mut acc = [0.0f32; 3];
        let mut n = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let Some(j) = self.idx(lx + dx, ly + dy) else {
                    continue;
                };
                if accept(j) {
                    for c in 0..3 {
                        acc[c] += self.px[j][c];
                    }
                    n += 1;
                }
            }
        }
        (n > 0).then(|| acc.map(|v| v / n as f32))
    }

    fn store(&self, canvas: &mut RgbImage, filled: &[bool]) {
        let w = self.bbox.w;
        for (i, p) in self.px.iter().enumerate().filter(|(i, _)| filled[*i]) {
            let (x, y) = (self.bbox.x + i as u32 % w, self.bbox.y + i as u32 / w);
            canvas.put_pixel(x, y, image::Rgb(p.map(|v| v.round().clamp(0.0, 255.0) as u8)));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/heal.rs"]
mod tests;
