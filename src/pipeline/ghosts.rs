//! Pareidolia scan: multi-scale sliding windows judged by a salience detector.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::{
    config::{GhostConfig, VoidConfig},
    foundation::error::VoidResult,
    oracle::SalienceDetector,
    pipeline::store,
    raster::decode,
    schema::Ghost,
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Window {
    x: u32,
    y: u32,
    size: u32,
}

impl Window {
    /// Intersection area as a fraction of the smaller window.
    fn overlap(&self, o: &Window) -> f32 {
        let ix = (self.x + self.size).min(o.x + o.size).saturating_sub(self.x.max(o.x));
        let iy = (self.y + self.size).min(o.y + o.size).saturating_sub(self.y.max(o.y));
        let inter = u64::from(ix) * u64::from(iy);
        let smaller = u64::from(self.size.min(o.size)).pow(2);
        if smaller == 0 {
            0.0
        } else {
            inter as f32 / smaller as f32
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GhostScanner {
    cfg: GhostConfig,
}

impl GhostScanner {
    pub fn new(cfg: GhostConfig) -> Self {
        Self { cfg }
    }

    /// Ghosts found in `image`, largest first.
    pub fn scan(&self, image: &RgbImage, detector: &dyn SalienceDetector) -> Vec<Ghost> {
        let (w, h) = image.dimensions();
        let mut hits = Vec::new();

        let mut size = self.cfg.min_size.max(3);
        while size <= w.min(h) {
            let stride = ((size as f32 * self.cfg.stride_fraction) as u32).max(1);
            for y in (0..=h - size).step_by(stride as usize) {
                for x in (0..=w - size).step_by(stride as usize) {
                    let patch = image::imageops::crop_imm(image, x, y, size, size).to_image();
                    if detector.detect_salient_region(&patch) {
                        hits.push(Window { x, y, size });
                    }
                }
            }
            size = ((size as f32 * self.cfg.scale_step).ceil() as u32).max(size + 1);
        }

        // Largest window wins overlaps; stable sort keeps scan order otherwise.
        hits.sort_by(|a, b| b.size.cmp(&a.size));
        let mut kept: Vec<Window> = Vec::new();
        for hit in hits {
            if kept.len() >= self.cfg.max_ghosts {
                break;
            }
            if kept.iter().all(|k| k.overlap(&hit) <= self.cfg.merge_overlap) {
                kept.push(hit);
            }
        }

        let (fw, fh) = (f64::from(w), f64::from(h));
        kept.into_iter()
            .map(|k| {
                let s = f64::from(k.size);
                Ghost {
                    x: (f64::from(k.x) + s / 2.0) / fw,
                    y: 1.0 - (f64::from(k.y) + s / 2.0) / fh,
                    w: s / fw,
                    h: s / fh,
                    confidence: f64::from(self.cfg.confidence),
                }
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    /// Records whose source image was missing or unreadable.
    pub skipped: usize,
    pub ghosts: usize,
}

/// Rescan every record's source image and store the ghosts in place.
#[tracing::instrument(skip_all, fields(data_dir = %cfg.paths.data_dir.display()))]
pub fn scan_records(cfg: &VoidConfig, detector: &dyn SalienceDetector) -> VoidResult<ScanReport> {
    let scanner = GhostScanner::new(cfg.ghosts.clone());
    let mut report = ScanReport::default();

    for path in store::list_records(&cfg.paths.data_dir)? {
        let mut record = match store::load_record(&path) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                report.skipped += 1;
                continue;
            }
        };
        let source = locate_source(&cfg.paths.raw_dir, &record.meta.original_file);
        let image = match load_source(&source, cfg.grind.max_dimension) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(id = record.id(), error = %e, "source image unavailable");
                report.skipped += 1;
                continue;
            }
        };

        let ghosts = scanner.scan(&image, detector);
        tracing::info!(id = record.id(), ghosts = ghosts.len(), "scanned");
        report.ghosts += ghosts.len();
        report.scanned += 1;
        record.pareidolia = Some(ghosts);
        store::write_json_atomic(&path, &record)?;
    }
    Ok(report)
}

/// Source image of a record. Migrated records may store a bare id, in
/// which case the first existing `<name>.<ext>` is used.
fn locate_source(raw_dir: &Path, name: &str) -> PathBuf {
    let direct = raw_dir.join(name);
    if decode::is_source_image(&direct) {
        return direct;
    }
    decode::SOURCE_EXTENSIONS
        .iter()
        .map(|ext| raw_dir.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
        .unwrap_or(direct)
}

fn load_source(path: &Path, max_dim: u32) -> VoidResult<RgbImage> {
    Ok(decode::cap_dimension(decode::load_rgb(path)?, max_dim))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/ghosts.rs"]
mod tests;
