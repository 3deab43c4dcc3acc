//! Constraint filtering, score blending, and list construction.
//!
//! Scores are normalized per-benchmark to [0,1] before similarity-weighted
//! averaging so high-variance metrics don't dominate, then blended against
//! cost under the caller's predicted I/O ratio. Output is three capped lists
//! (performance-led, balanced, budget-led); a model may appear in all three.
//! Every ordering has a full deterministic tie-break chain.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::calibrate::ScoreMatrix;
use crate::catalog::{cost_short, ConstraintSet, Deployment, IoRatio, ModelEntity};
use crate::error::Result;

/// One cited benchmark row behind a ranked model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BenchmarkResult {
    pub benchmark_id: i64,
    pub score: f64,
    pub metric_unit: String,
    pub weight_used: f64,
    pub is_estimated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankMetrics {
    pub performance_index: f64,
    pub blended_cost_index: f64,
    pub blended_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedModel {
    pub model_id: i64,
    pub name_normalized: String,
    pub provider: String,
    pub rank_metrics: RankMetrics,
    pub benchmark_results: Vec<BenchmarkResult>,
    pub reason_for_ranking: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedLists {
    pub top_performance: Vec<RankedModel>,
    pub balanced: Vec<RankedModel>,
    pub budget: Vec<RankedModel>,
}

struct Scored<'a> {
    model: &'a ModelEntity,
    performance: f64,
    cost: f64,
    blended: f64,
    results: Vec<BenchmarkResult>,
}

/// Rank the snapshot's models against the candidate benchmarks surfaced by
/// semantic search. `candidates` pairs each benchmark id with its similarity
/// weight; `matrix` holds authoritative plus calibrated scores. A model left
/// with zero candidate scores after filtering cannot be ranked and is
/// excluded entirely.
pub fn rank(
    models: &[ModelEntity],
    constraints: &ConstraintSet,
    io_ratio: IoRatio,
    candidates: &[(i64, f32)],
    matrix: &ScoreMatrix,
    list_cap: usize,
) -> Result<RankedLists> {
    io_ratio.validate()?;

    let eligible: Vec<&ModelEntity> = models
        .iter()
        .filter(|m| passes_constraints(m, constraints))
        .filter(|m| candidates.iter().any(|&(bid, _)| matrix.get(m.id, bid).is_some()))
        .collect();

    debug!(
        eligible = eligible.len(),
        candidates = candidates.len(),
        "ranking pass"
    );

    // Per-benchmark min/max over the eligible models, for [0,1] scaling.
    let mut bounds: HashMap<i64, (f64, f64)> = HashMap::new();
    for &(bid, _) in candidates {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for model in &eligible {
            if let Some(cell) = matrix.get(model.id, bid) {
                min = min.min(cell.value);
                max = max.max(cell.value);
            }
        }
        if min.is_finite() {
            bounds.insert(bid, (min, max));
        }
    }

    let scored: Vec<Scored> = eligible
        .iter()
        .map(|&model| {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            let mut results = Vec::new();
            for &(bid, similarity) in candidates {
                let Some(cell) = matrix.get(model.id, bid) else {
                    continue;
                };
                let weight = f64::from(similarity).max(0.0);
                let (min, max) = bounds[&bid];
                // All candidates sharing one value is full credit, not zero.
                let normalized = if max > min { (cell.value - min) / (max - min) } else { 1.0 };
                weighted_sum += weight * normalized;
                weight_total += weight;
                results.push(BenchmarkResult {
                    benchmark_id: bid,
                    score: cell.value,
                    metric_unit: cell.metric_unit.clone(),
                    weight_used: weight,
                    is_estimated: cell.is_estimated,
                    source_url: cell.source_url.clone(),
                });
            }
            let performance = if weight_total > 0.0 { weighted_sum / weight_total } else { 0.0 };
            let cost = model.cost_input_1m * io_ratio.input + model.cost_output_1m * io_ratio.output;
            Scored {
                model,
                performance,
                cost,
                blended: performance / (1.0 + cost),
                results,
            }
        })
        .collect();

    let mut top = scored.iter().collect::<Vec<_>>();
    top.sort_by(|a, b| {
        b.performance
            .total_cmp(&a.performance)
            .then_with(|| a.cost.total_cmp(&b.cost))
            .then_with(|| a.model.name_normalized.cmp(&b.model.name_normalized))
    });

    let mut budget = scored.iter().collect::<Vec<_>>();
    budget.sort_by(|a, b| {
        a.cost
            .total_cmp(&b.cost)
            .then_with(|| b.performance.total_cmp(&a.performance))
            .then_with(|| a.model.name_normalized.cmp(&b.model.name_normalized))
    });

    let mut balanced = scored.iter().collect::<Vec<_>>();
    balanced.sort_by(|a, b| {
        b.blended
            .total_cmp(&a.blended)
            .then_with(|| a.model.name_normalized.cmp(&b.model.name_normalized))
    });

    Ok(RankedLists {
        top_performance: build_list(&top, list_cap, Axis::Performance),
        balanced: build_list(&balanced, list_cap, Axis::Balanced),
        budget: build_list(&budget, list_cap, Axis::Cost),
    })
}

#[derive(Clone, Copy)]
enum Axis {
    Performance,
    Balanced,
    Cost,
}

fn build_list(sorted: &[&Scored], cap: usize, axis: Axis) -> Vec<RankedModel> {
    sorted
        .iter()
        .take(cap)
        .map(|s| {
            let reason = match axis {
                Axis::Performance => format!(
                    "Performance-led: weighted index {:.3} across {} cited benchmarks",
                    s.performance,
                    s.results.len()
                ),
                Axis::Balanced => format!(
                    "Balanced: {:.3} performance per unit blended cost",
                    s.blended
                ),
                Axis::Cost => format!(
                    "Cost-led: {} per 1M tokens at the requested I/O mix",
                    cost_short(s.cost)
                ),
            };
            RankedModel {
                model_id: s.model.id,
                name_normalized: s.model.name_normalized.clone(),
                provider: s.model.provider.clone(),
                rank_metrics: RankMetrics {
                    performance_index: s.performance,
                    blended_cost_index: s.cost,
                    blended_score: s.blended,
                },
                benchmark_results: s.results.clone(),
                reason_for_ranking: reason,
            }
        })
        .collect()
}

fn passes_constraints(model: &ModelEntity, constraints: &ConstraintSet) -> bool {
    if model.is_outdated {
        return false;
    }
    if let Some(min) = constraints.min_context_window {
        if model.context_window < min {
            return false;
        }
    }
    if !constraints
        .modality_input
        .iter()
        .all(|m| model.modality_input.contains(m))
    {
        return false;
    }
    if !constraints
        .modality_output
        .iter()
        .all(|m| model.modality_output.contains(m))
    {
        return false;
    }
    if constraints.deployment == Deployment::Local && !model.is_open_weights {
        return false;
    }
    if constraints.require_reasoning && !model.is_reasoning_model {
        return false;
    }
    if constraints.require_tool_calling && !model.has_tool_calling {
        return false;
    }
    if let Some(min) = constraints.min_speed_class {
        if model.speed_class < min {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::ScoreCell;
    use crate::catalog::{Modality, SpeedClass};

    fn make_model(id: i64, name: &str, cost_in: f64, cost_out: f64) -> ModelEntity {
        ModelEntity {
            id,
            name_normalized: name.to_string(),
            provider: "test".to_string(),
            parameter_count: None,
            quantization: None,
            modality_input: vec![Modality::Text],
            modality_output: vec![Modality::Text],
            context_window: 128_000,
            cost_input_1m: cost_in,
            cost_output_1m: cost_out,
            speed_class: SpeedClass::Medium,
            speed_tps: None,
            is_open_weights: false,
            is_reasoning_model: false,
            has_tool_calling: true,
            is_outdated: false,
            superseded_by: None,
        }
    }

    fn cell(value: f64) -> ScoreCell {
        ScoreCell {
            value,
            metric_unit: "%".to_string(),
            source_url: None,
            is_estimated: false,
            bridge_benchmark_id: None,
        }
    }

    fn ratio() -> IoRatio {
        IoRatio { input: 0.8, output: 0.2 }
    }

    #[test]
    fn test_blended_cost_literal() {
        let models = vec![make_model(1, "a", 1.0, 2.0)];
        let mut matrix = ScoreMatrix::default();
        matrix.insert(1, 100, cell(50.0));

        let lists = rank(
            &models,
            &ConstraintSet::default(),
            ratio(),
            &[(100, 1.0)],
            &matrix,
            5,
        )
        .unwrap();

        let blended = lists.budget[0].rank_metrics.blended_cost_index;
        assert!((blended - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_io_ratio_rejected_before_work() {
        let err = rank(
            &[],
            &ConstraintSet::default(),
            IoRatio { input: 0.5, output: 0.6 },
            &[],
            &ScoreMatrix::default(),
            5,
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::CompassError::InvalidIoRatio { .. }));
    }

    #[test]
    fn test_constraint_violations_never_appear() {
        let mut small = make_model(1, "small-context", 0.5, 0.5);
        small.context_window = 8_000;
        let big = make_model(2, "big-context", 0.5, 0.5);

        let mut matrix = ScoreMatrix::default();
        matrix.insert(1, 100, cell(99.0));
        matrix.insert(2, 100, cell(50.0));

        let constraints = ConstraintSet {
            min_context_window: Some(32_000),
            ..Default::default()
        };
        let lists = rank(&[small, big], &constraints, ratio(), &[(100, 1.0)], &matrix, 5).unwrap();

        for list in [&lists.top_performance, &lists.balanced, &lists.budget] {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].model_id, 2);
        }
    }

    #[test]
    fn test_model_without_candidate_scores_excluded() {
        let scored = make_model(1, "scored", 0.5, 0.5);
        let unscored = make_model(2, "unscored", 0.1, 0.1);

        let mut matrix = ScoreMatrix::default();
        matrix.insert(1, 100, cell(80.0));
        // Model 2 has a score, but not on a candidate benchmark.
        matrix.insert(2, 999, cell(95.0));

        let lists = rank(
            &[scored, unscored],
            &ConstraintSet::default(),
            ratio(),
            &[(100, 1.0)],
            &matrix,
            5,
        )
        .unwrap();
        assert_eq!(lists.budget.len(), 1);
        assert_eq!(lists.budget[0].model_id, 1);
    }

    #[test]
    fn test_performance_weighting_and_normalization() {
        let strong = make_model(1, "strong", 1.0, 1.0);
        let weak = make_model(2, "weak", 1.0, 1.0);

        let mut matrix = ScoreMatrix::default();
        // Benchmark 100 spans 40..90, benchmark 200 spans 1200..1300 (elo-like).
        matrix.insert(1, 100, cell(90.0));
        matrix.insert(2, 100, cell(40.0));
        matrix.insert(1, 200, cell(1300.0));
        matrix.insert(2, 200, cell(1200.0));

        let lists = rank(
            &[strong, weak],
            &ConstraintSet::default(),
            ratio(),
            &[(100, 0.9), (200, 0.3)],
            &matrix,
            5,
        )
        .unwrap();

        let first = &lists.top_performance[0];
        assert_eq!(first.name_normalized, "strong");
        // Normalized to the per-benchmark extremes, strong is 1.0 everywhere.
        assert!((first.rank_metrics.performance_index - 1.0).abs() < 1e-9);
        let last = &lists.top_performance[1];
        assert!((last.rank_metrics.performance_index - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_performance_tie_broken_by_cost() {
        let pricey = make_model(1, "pricey", 10.0, 10.0);
        let cheap = make_model(2, "cheap", 0.5, 0.5);

        let mut matrix = ScoreMatrix::default();
        matrix.insert(1, 100, cell(80.0));
        matrix.insert(2, 100, cell(80.0));

        let lists = rank(
            &[pricey, cheap],
            &ConstraintSet::default(),
            ratio(),
            &[(100, 1.0)],
            &matrix,
            5,
        )
        .unwrap();
        assert_eq!(lists.top_performance[0].name_normalized, "cheap");
    }

    #[test]
    fn test_rank_is_deterministic() {
        let models = vec![
            make_model(1, "alpha", 1.0, 3.0),
            make_model(2, "beta", 2.0, 2.0),
            make_model(3, "gamma", 0.2, 0.8),
        ];
        let mut matrix = ScoreMatrix::default();
        matrix.insert(1, 100, cell(70.0));
        matrix.insert(2, 100, cell(85.0));
        matrix.insert(3, 100, cell(60.0));
        matrix.insert(1, 200, cell(55.0));
        matrix.insert(3, 200, cell(75.0));

        let candidates = [(100, 0.8f32), (200, 0.4f32)];
        let a = rank(&models, &ConstraintSet::default(), ratio(), &candidates, &matrix, 3).unwrap();
        let b = rank(&models, &ConstraintSet::default(), ratio(), &candidates, &matrix, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_estimated_scores_cited_as_estimates() {
        let model = make_model(1, "a", 1.0, 1.0);
        let mut matrix = ScoreMatrix::default();
        matrix.insert(
            1,
            100,
            ScoreCell {
                value: 72.5,
                metric_unit: "%".to_string(),
                source_url: None,
                is_estimated: true,
                bridge_benchmark_id: Some(200),
            },
        );

        let lists = rank(
            &[model],
            &ConstraintSet::default(),
            ratio(),
            &[(100, 1.0)],
            &matrix,
            5,
        )
        .unwrap();
        assert!(lists.top_performance[0].benchmark_results[0].is_estimated);
    }

    #[test]
    fn test_outdated_and_local_deployment_filters() {
        let mut outdated = make_model(1, "old", 0.5, 0.5);
        outdated.is_outdated = true;
        let mut closed = make_model(2, "closed", 0.5, 0.5);
        closed.is_open_weights = false;
        let mut open = make_model(3, "open", 0.5, 0.5);
        open.is_open_weights = true;

        let mut matrix = ScoreMatrix::default();
        for id in 1..=3 {
            matrix.insert(id, 100, cell(50.0));
        }

        let constraints = ConstraintSet {
            deployment: Deployment::Local,
            ..Default::default()
        };
        let lists = rank(
            &[outdated, closed, open],
            &constraints,
            ratio(),
            &[(100, 1.0)],
            &matrix,
            5,
        )
        .unwrap();
        assert_eq!(lists.budget.len(), 1);
        assert_eq!(lists.budget[0].name_normalized, "open");
    }
}
