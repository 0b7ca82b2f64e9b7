//! Inverse pinhole unprojection of strokes into viewer space.
//!
//! The camera sits at the origin looking down -Z. A stroke's bbox centre is
//! cast through the image plane and pushed out to its depth; its world size
//! grows linearly with that depth so it keeps its apparent size on screen.

use std::f64::consts::TAU;

use crate::{
    config::CameraConfig,
    extract::Stroke,
    foundation::core::{BBox, Resolution},
    foundation::error::{VoidError, VoidResult},
    foundation::math::{Rng64, fnv1a64_str},
};

/// Deterministic part of a projected stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub scale: f64,
}

/// A stroke ready for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldStroke {
    pub placement: Placement,
    /// Radians in `[0, 2π)`; cosmetic only.
    pub rotation: f64,
    pub color: [u8; 3],
}

impl WorldStroke {
    /// `[x, y, z, scale, rotation, r, g, b]`.
    pub fn to_tuple(&self) -> [f64; 8] {
        let p = self.placement;
        [
            p.x,
            p.y,
            p.z,
            p.scale,
            self.rotation,
            f64::from(self.color[0]),
            f64::from(self.color[1]),
            f64::from(self.color[2]),
        ]
    }
}

/// Camera intrinsics bound to one image size.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    res: Resolution,
    /// Image-plane height at unit distance.
    h1: f64,
    w1: f64,
}

impl Projector {
    pub fn new(res: Resolution, fov_deg: f64) -> VoidResult<Self> {
        if res.width == 0 || res.height == 0 {
            return Err(VoidError::validation("cannot project onto an empty image"));
        }
        if !(fov_deg > 0.0 && fov_deg < 180.0) {
            return Err(VoidError::validation(format!(
                "fov must be in (0, 180) degrees, got {fov_deg}"
            )));
        }
        let h1 = 2.0 * (fov_deg.to_radians() / 2.0).tan();
        let w1 = h1 * f64::from(res.width) / f64::from(res.height);
        Ok(Self { res, h1, w1 })
    }

    /// Where a bbox lands when pushed out to `depth` along the view axis.
    pub fn place(&self, bbox: BBox, depth: f64) -> Placement {
        let (w, h) = (f64::from(self.res.width), f64::from(self.res.height));
        let (u, v) = bbox.center();
        let un = u / w - 0.5;
        let vn = -(v / h - 0.5);
        let z = -depth;
        let s = f64::from(bbox.w.max(bbox.h));
        Placement {
            x: un * self.w1 * z.abs(),
            y: vn * self.h1 * z.abs(),
            z,
            scale: (s / h) * self.h1 * z.abs(),
        }
    }

    /// Project at the stroke's own depth with a rotation drawn from `rng`.
    pub fn project(&self, stroke: &Stroke, rng: &mut Rng64) -> WorldStroke {
        self.project_at(stroke, f64::from(stroke.depth), rng)
    }

    fn project_at(&self, stroke: &Stroke, depth: f64, rng: &mut Rng64) -> WorldStroke {
        WorldStroke {
            placement: self.place(stroke.bbox, depth),
            rotation: rng.next_f64_01() * TAU,
            color: stroke.color,
        }
    }
}

/// Render-ready point cloud of one artifact.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CloudRecord {
    pub id: String,
    pub fov: f64,
    pub strokes: Vec<[f64; 8]>,
}

/// Project every stroke of an artifact, mapping normalized depth into
/// `[near, near + depth_range]` first.
///
/// The rotation stream is seeded from the camera seed and the artifact id,
/// so re-running yields identical output.
pub fn build_cloud(
    id: &str,
    res: Resolution,
    strokes: &[Stroke],
    camera: &CameraConfig,
) -> VoidResult<CloudRecord> {
    let projector = Projector::new(res, camera.fov_deg)?;
    let mut rng = Rng64::new(camera.seed ^ fnv1a64_str(id));
    let strokes = strokes
        .iter()
        .map(|s| {
            let depth = camera.near + f64::from(s.depth) * camera.depth_range;
            projector.project_at(s, depth, &mut rng).to_tuple()
        })
        .collect();
    Ok(CloudRecord {
        id: id.to_owned(),
        fov: camera.fov_deg,
        strokes,
    })
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
