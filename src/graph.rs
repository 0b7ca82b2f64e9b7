//! Cross-artifact similarity graph.
//!
//! Scoring compares every descriptor against every descriptor of every other
//! artifact, applies the threshold and the pareidolia boost, and keeps the
//! strongest edge per ordered artifact pair as it goes. [`GraphBuilder::resolve`]
//! does the same for candidates scored elsewhere.

pub mod navigate;
pub mod similarity;

use std::collections::BTreeMap;

use crate::{config::GraphConfig, foundation::error::VoidResult};

pub use navigate::{color_distance, nearest_neighbors};
pub use similarity::{cosine, normalized};

/// One vector describing an artifact (or one of its strokes).
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    pub artifact: String,
    pub vector: Vec<f32>,
    /// The region this vector describes looks like a face.
    pub face: bool,
}

/// Raw score between two descriptors of different artifacts.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCandidate {
    pub source: String,
    pub target: String,
    pub score: f64,
    pub source_face: bool,
    pub target_face: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Similarity,
    Pareidolia,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub file: String,
    /// Descriptors that took part in scoring.
    pub descriptors: usize,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphRecord {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphBuilder {
    pub threshold: f64,
    pub pareidolia_floor: f64,
    pub pareidolia_boost: f64,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

impl GraphBuilder {
    pub fn from_config(cfg: &GraphConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            pareidolia_floor: cfg.pareidolia_floor,
            pareidolia_boost: cfg.pareidolia_boost,
        }
    }

    /// Weight and kind a candidate would carry, or `None` if it is dropped.
    pub fn judge(&self, c: &EdgeCandidate) -> Option<(f64, EdgeKind)> {
        self.judge_score(c.score, c.source_face, c.target_face)
    }

    /// [`Self::judge`] on the bare score and face flags.
    pub fn judge_score(
        &self,
        score: f64,
        source_face: bool,
        target_face: bool,
    ) -> Option<(f64, EdgeKind)> {
        if !score.is_finite() {
            return None;
        }
        let (weight, kind) = if !source_face && target_face && score > self.pareidolia_floor {
            (score + self.pareidolia_boost, EdgeKind::Pareidolia)
        } else {
            (score, EdgeKind::Similarity)
        };
        (weight > self.threshold).then_some((weight, kind))
    }

    /// Filter, boost and deduplicate candidates. Output is sorted by
    /// `(source, target)`; on equal weights the first candidate wins.
    pub fn resolve(&self, candidates: &[EdgeCandidate]) -> Vec<Edge> {
        let mut best: BTreeMap<(&str, &str), (f64, EdgeKind)> = BTreeMap::new();
        for c in candidates {
            if c.source == c.target {
                continue;
            }
            let Some((weight, kind)) = self.judge(c) else {
                continue;
            };
            best.entry((c.source.as_str(), c.target.as_str()))
                .and_modify(|cur| {
                    if weight > cur.0 {
                        *cur = (weight, kind);
                    }
                })
                .or_insert((weight, kind));
        }
        best.into_iter()
            .map(|((source, target), (weight, kind))| Edge {
                source: source.to_owned(),
                target: target.to_owned(),
                weight,
                kind,
            })
            .collect()
    }

    /// Score all descriptors and resolve the result into a graph over `nodes`.
    #[tracing::instrument(skip_all, fields(nodes = nodes.len(), descriptors = descriptors.len()))]
    pub fn build(
        &self,
        nodes: Vec<GraphNode>,
        descriptors: &[Descriptor],
    ) -> VoidResult<GraphRecord> {
        let edges = similarity::best_edges(descriptors, |score, source_face, target_face| {
            self.judge_score(score, source_face, target_face)
        })?;
        tracing::info!(
            edges = edges.len(),
            pareidolia = edges.iter().filter(|e| e.kind == EdgeKind::Pareidolia).count(),
            "graph resolved"
        );
        Ok(GraphRecord { nodes, edges })
    }
}

#[cfg(test)]
#[path = "../tests/unit/graph/builder.rs"]
mod tests;
