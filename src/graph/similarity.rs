use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::{
    foundation::error::{VoidError, VoidResult},
    graph::{Descriptor, Edge, EdgeKind},
};

/// Norms below this are treated as zero.
const NORM_FLOOR: f64 = 1e-10;

/// L2-normalize; a zero vector stays zero.
pub fn normalized(v: &[f32]) -> Vec<f64> {
    let norm = v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm = if norm < NORM_FLOOR { NORM_FLOOR } else { norm };
    v.iter().map(|x| f64::from(*x) / norm).collect()
}

/// Cosine similarity of two equally sized vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    dot(&normalized(a), &normalized(b))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

type PairMap = BTreeMap<(usize, usize), (f64, EdgeKind)>;

/// Strongest judged edge per ordered artifact pair, sorted by `(source, target)`.
///
/// Every cross-artifact descriptor pair is scored by cosine and passed to
/// `judge` as `(score, source_face, target_face)`. Pairs within one artifact
/// are skipped. Each rayon split folds into a map with at most one entry per
/// artifact pair, so memory grows with the artifact count and never with the
/// descriptor count. On equal weights the pair met first in descriptor order
/// wins.
pub fn best_edges<J>(descriptors: &[Descriptor], judge: J) -> VoidResult<Vec<Edge>>
where
    J: Fn(f64, bool, bool) -> Option<(f64, EdgeKind)> + Sync,
{
    let Some(first) = descriptors.first() else {
        return Ok(Vec::new());
    };
    let dim = first.vector.len();
    if let Some(bad) = descriptors.iter().find(|d| d.vector.len() != dim) {
        return Err(VoidError::validation(format!(
            "descriptor of '{}' has length {}, expected {dim}",
            bad.artifact,
            bad.vector.len()
        )));
    }

    // Sorted ids, so index order is name order.
    let ids: Vec<&str> = descriptors
        .iter()
        .map(|d| d.artifact.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let slot: Vec<usize> = descriptors
        .iter()
        .map(|d| ids.binary_search(&d.artifact.as_str()).unwrap_or_else(|i| i))
        .collect();
    let unit: Vec<Vec<f64>> = descriptors.par_iter().map(|d| normalized(&d.vector)).collect();

    let best = descriptors
        .par_iter()
        .enumerate()
        .fold(PairMap::new, |mut acc, (i, src)| {
            for (j, dst) in descriptors.iter().enumerate() {
                if slot[i] == slot[j] {
                    continue;
                }
                if let Some(hit) = judge(dot(&unit[i], &unit[j]), src.face, dst.face) {
                    keep_stronger(&mut acc, (slot[i], slot[j]), hit);
                }
            }
            acc
        })
        .reduce(PairMap::new, |mut left, right| {
            for (pair, hit) in right {
                keep_stronger(&mut left, pair, hit);
            }
            left
        });

    Ok(best
        .into_iter()
        .map(|((s, t), (weight, kind))| Edge {
            source: ids[s].to_owned(),
            target: ids[t].to_owned(),
            weight,
            kind,
        })
        .collect())
}

/// Replace only on a strictly greater weight.
fn keep_stronger(map: &mut PairMap, pair: (usize, usize), hit: (f64, EdgeKind)) {
    map.entry(pair)
        .and_modify(|cur| {
            if hit.0 > cur.0 {
                *cur = hit;
            }
        })
        .or_insert(hit);
}

#[cfg(test)]
#[path = "../../tests/unit/graph/similarity.rs"]
mod tests;
