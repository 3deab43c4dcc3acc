//! Cross-benchmark score calibration via bridge-model offset inference.
//!
//! A model may lack a score on the benchmark variant a query surfaced while
//! holding one on a related "bridge" variant of the same base benchmark. The
//! engine transfers that bridge score across the gap using the mean offset
//! observed among models scored on both benchmarks. Estimates are derived
//! from authoritative entries only -- an estimate never feeds another
//! estimate -- and a cell with fewer than two anchor models stays absent.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::catalog::{BenchmarkEntity, ScoreEntry};
use crate::normalize;

/// One cell of the working score matrix for a single ranking request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCell {
    pub value: f64,
    pub metric_unit: String,
    pub source_url: Option<String>,
    pub is_estimated: bool,
    /// The benchmark whose score was transferred, for citation.
    pub bridge_benchmark_id: Option<i64>,
}

/// Sparse model-by-benchmark score matrix.
#[derive(Debug, Clone, Default)]
pub struct ScoreMatrix {
    cells: HashMap<(i64, i64), ScoreCell>,
}

impl ScoreMatrix {
    /// Build from authoritative catalog scores. Ingestion guarantees at most
    /// one entry per pair; if the snapshot carries duplicates anyway, the
    /// first wins.
    pub fn from_scores(scores: &[ScoreEntry]) -> Self {
        let mut matrix = Self::default();
        for score in scores {
            matrix
                .cells
                .entry((score.model_id, score.benchmark_id))
                .or_insert(ScoreCell {
                    value: score.score_value,
                    metric_unit: score.metric_unit.clone(),
                    source_url: score.source_url.clone(),
                    is_estimated: false,
                    bridge_benchmark_id: None,
                });
        }
        matrix
    }

    pub fn get(&self, model_id: i64, benchmark_id: i64) -> Option<&ScoreCell> {
        self.cells.get(&(model_id, benchmark_id))
    }

    pub fn insert(&mut self, model_id: i64, benchmark_id: i64, cell: ScoreCell) {
        self.cells.insert((model_id, benchmark_id), cell);
    }

    /// Models present in the matrix, in ascending id order.
    pub fn model_ids(&self) -> Vec<i64> {
        let set: BTreeSet<i64> = self.cells.keys().map(|&(m, _)| m).collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Fill missing `(model, target)` cells where a bridge benchmark sharing the
/// target's base identity can carry the score across. Returns a new matrix;
/// the input snapshot is never mutated.
pub fn estimate(
    matrix: &ScoreMatrix,
    benchmarks: &[BenchmarkEntity],
    target_ids: &[i64],
    bridge_ids: &[i64],
) -> ScoreMatrix {
    let base_ids: HashMap<i64, String> = benchmarks
        .iter()
        .map(|b| (b.id, normalize::normalize_benchmark(&b.name_normalized).base_id))
        .collect();

    let model_ids = matrix.model_ids();
    let mut filled = matrix.clone();
    let mut estimated = 0usize;

    for &model in &model_ids {
        for &target in target_ids {
            if filled.get(model, target).is_some() {
                continue;
            }
            let Some(target_base) = base_ids.get(&target) else {
                continue;
            };

            // Bridges are tried in the supplied order; the first with enough
            // anchors wins.
            for &bridge in bridge_ids {
                if bridge == target || base_ids.get(&bridge) != Some(target_base) {
                    continue;
                }
                let Some(bridge_cell) = matrix.get(model, bridge) else {
                    continue;
                };
                if bridge_cell.is_estimated {
                    continue;
                }

                let mut offsets = Vec::new();
                let mut unit = None;
                for &anchor in &model_ids {
                    if anchor == model {
                        continue;
                    }
                    let (Some(on_target), Some(on_bridge)) =
                        (matrix.get(anchor, target), matrix.get(anchor, bridge))
                    else {
                        continue;
                    };
                    if on_target.is_estimated || on_bridge.is_estimated {
                        continue;
                    }
                    offsets.push(on_target.value - on_bridge.value);
                    unit.get_or_insert_with(|| on_target.metric_unit.clone());
                }

                if offsets.len() < 2 {
                    continue;
                }
                let offset = offsets.iter().sum::<f64>() / offsets.len() as f64;

                filled.insert(
                    model,
                    target,
                    ScoreCell {
                        value: bridge_cell.value + offset,
                        metric_unit: unit.unwrap_or_else(|| bridge_cell.metric_unit.clone()),
                        source_url: None,
                        is_estimated: true,
                        bridge_benchmark_id: Some(bridge),
                    },
                );
                estimated += 1;
                break;
            }
        }
    }

    debug!(estimated, "calibration pass complete");
    filled
}
