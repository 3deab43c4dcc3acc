//! Exact-match entity resolution against an in-memory catalog snapshot.
//!
//! The lookup is built once per ingestion batch, keyed by the exact resolution
//! tuple: `(name, variant)` for benchmarks, `(name, provider, quantization)`
//! for models. There is no fuzzy fallback; a failed lookup is an
//! `UnresolvedForeignKey` that skips the offending record and never the batch.
//! The Jaro-Winkler hint attached to the error is for the human reading the
//! batch report only -- it plays no part in resolution.

use std::collections::HashMap;

use crate::catalog::{BenchmarkEntity, Catalog, ModelEntity, RawBenchmarkRecord, RawModelRecord};
use crate::error::{CompassError, Result};
use crate::normalize::{self, EntityKind, NormalizedName};

/// Similarity floor below which no "closest known" hint is offered.
const HINT_THRESHOLD: f64 = 0.8;

type ModelKey = (String, String, String);
type BenchmarkKey = (String, String);

#[derive(Debug, Default)]
pub struct Resolver {
    model_ids: HashMap<ModelKey, i64>,
    benchmark_ids: HashMap<BenchmarkKey, i64>,
    model_names: Vec<String>,
    benchmark_names: Vec<String>,
}

impl Resolver {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut resolver = Self::default();
        for benchmark in &catalog.benchmarks {
            resolver.index_benchmark(benchmark);
        }
        for model in &catalog.models {
            resolver.index_model(model);
        }
        resolver
    }

    /// Exact lookup of a model by its raw score-record name.
    pub fn resolve_model(&self, raw_name: &str) -> Result<i64> {
        let key = model_key(raw_name, None);
        match self.model_ids.get(&key) {
            Some(&id) => Ok(id),
            None => Err(CompassError::UnresolvedForeignKey {
                kind: EntityKind::Model.label(),
                name: raw_name.to_string(),
                closest: closest_name(raw_name, &self.model_names),
            }),
        }
    }

    /// Exact lookup of a benchmark by its raw score-record name and optional
    /// explicit variant.
    pub fn resolve_benchmark(&self, raw_name: &str, variant: Option<&str>) -> Result<i64> {
        let key = benchmark_key(raw_name, variant);
        match self.benchmark_ids.get(&key) {
            Some(&id) => Ok(id),
            None => Err(CompassError::UnresolvedForeignKey {
                kind: EntityKind::Benchmark.label(),
                name: raw_name.to_string(),
                closest: closest_name(raw_name, &self.benchmark_names),
            }),
        }
    }

    /// Get-or-create for a raw benchmark-dictionary record. An existing entity
    /// under the same resolution key wins; otherwise a new entity is appended
    /// to the catalog with the next free id.
    pub fn resolve_or_create_benchmark(
        &mut self,
        catalog: &mut Catalog,
        record: &RawBenchmarkRecord,
    ) -> i64 {
        let key = benchmark_key(&record.name_normalized, record.variant.as_deref());
        if let Some(&id) = self.benchmark_ids.get(&key) {
            return id;
        }
        let entity = BenchmarkEntity {
            id: catalog.next_benchmark_id(),
            name_normalized: record.name_normalized.clone(),
            variant: record.variant.clone(),
            description: record.description.clone(),
            categories: record.categories.clone(),
        };
        let id = entity.id;
        self.index_benchmark(&entity);
        catalog.benchmarks.push(entity);
        id
    }

    pub fn resolve_or_create_model(
        &mut self,
        catalog: &mut Catalog,
        record: &RawModelRecord,
    ) -> i64 {
        let key = model_key(&record.name_normalized, record.quantization.as_deref());
        if let Some(&id) = self.model_ids.get(&key) {
            return id;
        }
        let entity = ModelEntity {
            id: catalog.next_model_id(),
            name_normalized: record.name_normalized.clone(),
            provider: record.provider.clone(),
            parameter_count: record.parameter_count,
            quantization: record.quantization.clone(),
            modality_input: record.modality_input.clone(),
            modality_output: record.modality_output.clone(),
            context_window: record.context_window,
            cost_input_1m: record.cost_input_1m,
            cost_output_1m: record.cost_output_1m,
            speed_class: record.speed_class,
            speed_tps: record.speed_tps,
            is_open_weights: record.is_open_weights,
            is_reasoning_model: record.is_reasoning_model,
            has_tool_calling: record.has_tool_calling,
            is_outdated: record.is_outdated,
            superseded_by: None,
        };
        let id = entity.id;
        self.index_model(&entity);
        catalog.models.push(entity);
        id
    }

    fn index_benchmark(&mut self, entity: &BenchmarkEntity) {
        let key = benchmark_key(&entity.name_normalized, entity.variant.as_deref());
        self.benchmark_ids.insert(key, entity.id);
        self.benchmark_names.push(entity.name_normalized.clone());
    }

    fn index_model(&mut self, entity: &ModelEntity) {
        let key = model_key(&entity.name_normalized, entity.quantization.as_deref());
        self.model_ids.insert(key, entity.id);
        self.model_names.push(entity.name_normalized.clone());
    }
}

/// Model resolution key. The provider component is derived from the name on
/// both sides of the lookup (score records carry no provider column), and
/// score records always resolve against the unquantized entity.
fn model_key(raw_name: &str, quantization: Option<&str>) -> ModelKey {
    let n = normalize::normalize_model(raw_name);
    (
        n.canonical_id.clone(),
        n.provider,
        quantization.map(normalize::slug).unwrap_or_default(),
    )
}

/// Benchmark resolution key: the dated identity without its variant segment,
/// paired with the variant. An explicit variant field wins; otherwise the
/// variant facet the normalizer extracted from the name is used.
fn benchmark_key(raw_name: &str, variant: Option<&str>) -> BenchmarkKey {
    let n = normalize::normalize_benchmark(raw_name);
    let variant_part = match variant {
        Some(v) => normalize::slug(v),
        None if n.variant != "standard" => n.variant.clone(),
        None => String::new(),
    };
    (dated_id(&n), variant_part)
}

fn dated_id(n: &NormalizedName) -> String {
    match n.release_date {
        Some(date) => format!("{}-{}", n.base_id, date.format("%Y-%m-%d")),
        None => n.base_id.clone(),
    }
}

fn closest_name(raw: &str, known: &[String]) -> String {
    let raw_lower = raw.to_lowercase();
    known
        .iter()
        .map(|name| (strsim::jaro_winkler(&raw_lower, &name.to_lowercase()), name))
        .filter(|(score, _)| *score >= HINT_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name.clone())
        .unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_catalog() -> Catalog {
        Catalog {
            benchmarks: vec![
                BenchmarkEntity {
                    id: 1,
                    name_normalized: "MMLU".to_string(),
                    variant: Some("5-shot".to_string()),
                    description: "Multi-task language understanding".to_string(),
                    categories: vec!["knowledge".to_string()],
                },
                BenchmarkEntity {
                    id: 2,
                    name_normalized: "MMLU".to_string(),
                    variant: None,
                    description: "Multi-task language understanding".to_string(),
                    categories: vec![],
                },
            ],
            models: vec![ModelEntity {
                id: 10,
                name_normalized: "GPT-4o".to_string(),
                provider: "OpenAI".to_string(),
                parameter_count: None,
                quantization: None,
                modality_input: vec![],
                modality_output: vec![],
                context_window: 128_000,
                cost_input_1m: 2.5,
                cost_output_1m: 10.0,
                speed_class: Default::default(),
                speed_tps: None,
                is_open_weights: false,
                is_reasoning_model: false,
                has_tool_calling: true,
                is_outdated: false,
                superseded_by: None,
            }],
            scores: vec![],
        }
    }

    #[test]
    fn test_model_resolves_across_spellings() {
        let resolver = Resolver::from_catalog(&make_catalog());
        assert_eq!(resolver.resolve_model("GPT-4o").unwrap(), 10);
        assert_eq!(resolver.resolve_model("gpt-4o").unwrap(), 10);
        assert_eq!(resolver.resolve_model("GPT4o").unwrap(), 10);
    }

    #[test]
    fn test_unknown_model_reports_closest() {
        let resolver = Resolver::from_catalog(&make_catalog());
        let err = resolver.resolve_model("gpt-4o-mini").unwrap_err();
        match err {
            CompassError::UnresolvedForeignKey { kind, closest, .. } => {
                assert_eq!(kind, "model");
                assert_eq!(closest, "GPT-4o");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_model_without_hint() {
        let resolver = Resolver::from_catalog(&make_catalog());
        let err = resolver.resolve_model("totally-different-name").unwrap_err();
        match err {
            CompassError::UnresolvedForeignKey { closest, .. } => assert_eq!(closest, "none"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_benchmark_variants_are_distinct() {
        let resolver = Resolver::from_catalog(&make_catalog());
        assert_eq!(resolver.resolve_benchmark("MMLU", Some("5-shot")).unwrap(), 1);
        assert_eq!(resolver.resolve_benchmark("mmlu", None).unwrap(), 2);
        assert!(resolver.resolve_benchmark("MMLU", Some("0-shot")).is_err());
    }

    #[test]
    fn test_resolve_or_create_is_get_or_create() {
        let mut catalog = make_catalog();
        let mut resolver = Resolver::from_catalog(&catalog);
        let record = RawBenchmarkRecord {
            name_normalized: "MMLU".to_string(),
            variant: Some("5-shot".to_string()),
            description: "dup".to_string(),
            categories: vec![],
        };
        // Existing key returns the existing id; nothing is appended.
        assert_eq!(resolver.resolve_or_create_benchmark(&mut catalog, &record), 1);
        assert_eq!(catalog.benchmarks.len(), 2);

        let fresh = RawBenchmarkRecord {
            name_normalized: "GPQA".to_string(),
            variant: None,
            description: "Graduate-level QA".to_string(),
            categories: vec![],
        };
        let id = resolver.resolve_or_create_benchmark(&mut catalog, &fresh);
        assert_eq!(id, 3);
        assert_eq!(catalog.benchmarks.len(), 3);
        assert_eq!(resolver.resolve_benchmark("gpqa", None).unwrap(), id);
    }
}
