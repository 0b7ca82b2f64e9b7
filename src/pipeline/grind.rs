//! Per-artifact processing and shard batches.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use image::RgbImage;

use crate::{
    config::VoidConfig,
    extract::{StrokeExtractor, annotate_strokes, dominant_color},
    foundation::core::Resolution,
    foundation::error::{VoidError, VoidResult},
    oracle::{OracleError, OracleSet},
    pipeline::{ghosts::GhostScanner, store},
    raster::{decode, depth::DepthMap, mask::grid_masks},
    schema::{ArtifactMeta, ArtifactRecord, CURRENT_SCHEMA, StrokeEntry, migrate::year_and_title},
    shard::ShardSpec,
};

static WRITE_CHECK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Why an artifact produced no record.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ArtifactFailure {
    #[error("{oracle} oracle timed out after {after:?}")]
    OracleTimeout { oracle: &'static str, after: Duration },
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("writing record failed: {0}")]
    Write(String),
}

/// Substitutes used while processing one artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fallbacks {
    pub flat_depth: bool,
    pub grid_masks: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArtifactOutcome {
    Processed {
        id: String,
        strokes: usize,
        ghosts: usize,
        fallbacks: Fallbacks,
    },
    /// A record already exists; nothing was read or written.
    AlreadyDone { id: String },
    Unreadable { path: PathBuf, reason: String },
    /// Below the minimum resolution. `removed` tells whether the source was deleted.
    Rejected {
        id: String,
        width: u32,
        height: u32,
        removed: bool,
    },
    Failed { id: String, failure: ArtifactFailure },
}

/// Aggregate of one batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub already_done: usize,
    pub unreadable: usize,
    pub rejected: usize,
    pub failed: Vec<(String, ArtifactFailure)>,
    pub flat_depth_fallbacks: usize,
    pub grid_mask_fallbacks: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: &ArtifactOutcome) {
        match outcome {
            ArtifactOutcome::Processed { fallbacks, .. } => {
                self.processed += 1;
                self.flat_depth_fallbacks += usize::from(fallbacks.flat_depth);
                self.grid_mask_fallbacks += usize::from(fallbacks.grid_masks);
            }
            ArtifactOutcome::AlreadyDone { .. } => self.already_done += 1,
            ArtifactOutcome::Unreadable { .. } => self.unreadable += 1,
            ArtifactOutcome::Rejected { .. } => self.rejected += 1,
            ArtifactOutcome::Failed { id, failure } => {
                self.failed.push((id.clone(), failure.clone()));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.already_done + self.unreadable + self.rejected + self.failed.len()
    }
}

/// Owns the oracles and settings of one worker.
#[derive(Debug)]
pub struct Grinder {
    cfg: VoidConfig,
    oracles: OracleSet,
    extractor: StrokeExtractor,
    scanner: GhostScanner,
}

impl Grinder {
    pub fn new(cfg: VoidConfig, oracles: OracleSet) -> VoidResult<Self> {
        cfg.validate()?;
        Ok(Self {
            extractor: StrokeExtractor::new(cfg.grind.heal_dilation),
            scanner: GhostScanner::new(cfg.ghosts.clone()),
            cfg,
            oracles,
        })
    }

    pub fn config(&self) -> &VoidConfig {
        &self.cfg
    }

    /// Make sure records can be written before any work starts.
    pub fn prepare_output(&self) -> VoidResult<()> {
        let dir = &self.cfg.paths.data_dir;
        fs::create_dir_all(dir).map_err(|e| {
            VoidError::startup(format!("cannot create output directory '{}': {e}", dir.display()))
        })?;
        // Unique per call: shard workers share the directory and nothing else.
        let check = dir.join(format!(
            ".voidgrind-write-check-{}-{}",
            std::process::id(),
            WRITE_CHECK_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&check, b"").map_err(|e| {
            VoidError::startup(format!("output directory '{}' is not writable: {e}", dir.display()))
        })?;
        match fs::remove_file(&check) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(anyhow::Error::new(e).context(format!("remove '{}'", check.display())).into())
            }
            _ => Ok(()),
        }
    }

    /// Grind one source image. Never fails the caller; every problem is an outcome.
    #[tracing::instrument(skip_all, fields(source = %source.display()))]
    pub fn process_artifact(&self, source: &Path) -> ArtifactOutcome {
        let id = match store::file_id(source) {
            Ok(id) => id,
            Err(e) => {
                return ArtifactOutcome::Unreadable {
                    path: source.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };
        let out = store::record_path(&self.cfg.paths.data_dir, &id);
        if out.exists() {
            tracing::debug!(id = %id, "already ground");
            return ArtifactOutcome::AlreadyDone { id };
        }

        let image = match decode::load_rgb(source) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "skipping unreadable source");
                return ArtifactOutcome::Unreadable {
                    path: source.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };

        let (width, height) = image.dimensions();
        let min = self.cfg.grind.min_resolution;
        if width < min || height < min {
            let removed = self.cfg.grind.delete_rejected && remove_source(source);
            tracing::warn!(id = %id, width, height, removed, "rejected: below minimum resolution");
            return ArtifactOutcome::Rejected {
                id,
                width,
                height,
                removed,
            };
        }

        let image = Arc::new(decode::cap_dimension(image, self.cfg.grind.max_dimension));
        let file = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone());

        match self.grind(&id, &file, &image) {
            Ok((record, fallbacks)) => {
                if let Err(e) = store::write_json_atomic(&out, &record) {
                    return ArtifactOutcome::Failed {
                        id,
                        failure: ArtifactFailure::Write(e.to_string()),
                    };
                }
                let outcome = ArtifactOutcome::Processed {
                    strokes: record.meta.stroke_count,
                    ghosts: record.ghost_count(),
                    fallbacks,
                    id,
                };
                tracing::info!(?outcome, "ground");
                outcome
            }
            Err(failure) => {
                tracing::warn!(id = %id, %failure, "artifact failed");
                ArtifactOutcome::Failed { id, failure }
            }
        }
    }

    fn grind(
        &self,
        id: &str,
        file: &str,
        image: &Arc<RgbImage>,
    ) -> Result<(ArtifactRecord, Fallbacks), ArtifactFailure> {
        let res = Resolution::new(image.width(), image.height());
        let mut fallbacks = Fallbacks::default();

        let depth = match self.oracles.estimate_depth(image) {
            Ok(raw) => DepthMap::normalized(res, raw).unwrap_or_else(|e| {
                tracing::warn!(id, error = %e, "depth oracle output unusable; using flat depth");
                fallbacks.flat_depth = true;
                DepthMap::flat(res)
            }),
            Err(OracleError::Timeout(after)) => {
                return Err(ArtifactFailure::OracleTimeout {
                    oracle: "depth",
                    after,
                });
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "no depth; using flat depth");
                fallbacks.flat_depth = true;
                DepthMap::flat(res)
            }
        };

        let masks = match self.oracles.segment(image) {
            Ok(masks) if masks.iter().any(|m| m.resolve(res).is_some()) => masks,
            Ok(_) => {
                tracing::warn!(id, "segmentation returned nothing usable; using grid");
                fallbacks.grid_masks = true;
                grid_masks(res, self.cfg.grind.grid_tile)
            }
            Err(OracleError::Timeout(after)) => {
                return Err(ArtifactFailure::OracleTimeout {
                    oracle: "segmentation",
                    after,
                });
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "no segmentation; using grid");
                fallbacks.grid_masks = true;
                grid_masks(res, self.cfg.grind.grid_tile)
            }
        };

        let mut strokes = self
            .extractor
            .extract(image, &depth, &masks)
            .map_err(|e| ArtifactFailure::Extraction(e.to_string()))?;

        if self.cfg.grind.annotate_strokes {
            let n = annotate_strokes(
                &mut strokes,
                image,
                self.oracles.embedding.as_deref(),
                self.oracles.salience.as_deref(),
            );
            tracing::debug!(id, embedded = n, "annotated strokes");
        }

        let ghosts = match (&self.oracles.salience, self.cfg.grind.scan_ghosts) {
            (Some(det), true) => Some(self.scanner.scan(image, det.as_ref())),
            _ => None,
        };

        let embedding = self.oracles.embedding.as_ref().and_then(|o| {
            o.extract_embedding(image)
                .inspect_err(|e| tracing::debug!(id, error = %e, "artifact embedding"))
                .ok()
        });

        let (year, title) = year_and_title(id);
        let meta = ArtifactMeta {
            schema: CURRENT_SCHEMA,
            id: id.to_owned(),
            file: file.to_owned(),
            original_file: file.to_owned(),
            title,
            year,
            resolution: res,
            stroke_count: strokes.len(),
            dominant_color: dominant_color(strokes.iter().map(|s| s.color)).unwrap_or([0, 0, 0]),
            embedding,
            extra: Default::default(),
        };
        let record = ArtifactRecord {
            meta,
            strokes: strokes.into_iter().map(StrokeEntry::Stroke).collect(),
            pareidolia: ghosts,
            extra: Default::default(),
        };
        Ok((record, fallbacks))
    }

    /// Grind one file, or this shard's part of a directory.
    #[tracing::instrument(skip_all, fields(input = %input.display(), shard = shard.index(), total = shard.total()))]
    pub fn run_batch(&self, input: &Path, shard: ShardSpec) -> VoidResult<BatchReport> {
        if !input.exists() {
            return Err(VoidError::startup(format!(
                "input '{}' does not exist",
                input.display()
            )));
        }
        self.prepare_output()?;

        let sources = if input.is_dir() {
            let mine: Vec<PathBuf> = shard
                .select(list_sources(input)?)
                .into_iter()
                .map(|name| input.join(name))
                .collect();
            tracing::info!(files = mine.len(), "processing shard");
            mine
        } else {
            vec![input.to_path_buf()]
        };

        let mut report = BatchReport::default();
        for source in &sources {
            report.record(&self.process_artifact(source));
        }
        tracing::info!(
            processed = report.processed,
            already_done = report.already_done,
            unreadable = report.unreadable,
            rejected = report.rejected,
            failed = report.failed.len(),
            "batch done"
        );
        Ok(report)
    }
}

fn remove_source(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove rejected source");
            false
        }
    }
}

/// File names of source images directly inside `dir`.
fn list_sources(dir: &Path) -> VoidResult<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("read entry in '{}'", dir.display()))?.path();
        if !path.is_file() || !decode::is_source_image(&path) {
            continue;
        }
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => out.push(name.to_owned()),
            None => tracing::warn!(path = %path.display(), "skipping non UTF-8 file name"),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/grind.rs"]
mod tests;
