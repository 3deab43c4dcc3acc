//! Batch ingestion: normalize, resolve, insert.
//!
//! Batches are not atomic across records. A record that fails resolution is
//! skipped and reported in the batch report; its siblings continue. Entity
//! records are get-or-create; score records must resolve both foreign keys
//! and may not duplicate an existing authoritative entry.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, RawBatch, RawScoreRecord, ScoreEntry};
use crate::resolve::Resolver;

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub benchmarks_created: usize,
    pub models_created: usize,
    pub scores_created: usize,
    pub failed: Vec<FailedRecord>,
}

#[derive(Debug, Serialize)]
pub struct FailedRecord {
    pub record: String,
    pub reason: String,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.benchmarks_created + self.models_created + self.scores_created
    }
}

pub fn ingest(catalog: &mut Catalog, batch: RawBatch) -> IngestReport {
    let mut resolver = Resolver::from_catalog(catalog);
    let mut report = IngestReport::default();

    let before = catalog.benchmarks.len();
    for record in &batch.benchmarks {
        resolver.resolve_or_create_benchmark(catalog, record);
    }
    report.benchmarks_created = catalog.benchmarks.len() - before;

    let before = catalog.models.len();
    for record in &batch.models {
        resolver.resolve_or_create_model(catalog, record);
    }
    report.models_created = catalog.models.len() - before;

    let mut seen: std::collections::HashSet<(i64, i64)> = catalog
        .scores
        .iter()
        .map(|s| (s.model_id, s.benchmark_id))
        .collect();

    for record in &batch.scores {
        match resolve_score(&resolver, record) {
            Ok((model_id, benchmark_id)) => {
                if !seen.insert((model_id, benchmark_id)) {
                    report.failed.push(FailedRecord {
                        record: describe_score(record),
                        reason: "duplicate authoritative score for this model/benchmark pair"
                            .to_string(),
                    });
                    continue;
                }
                catalog.scores.push(ScoreEntry {
                    model_id,
                    benchmark_id,
                    score_value: record.score_value,
                    metric_unit: record.metric_unit.clone(),
                    source_url: record.source_url.clone(),
                    source_name: record.source_url.as_deref().and_then(source_host),
                    date_published: record.date_published,
                    original_model_name: record.original_model_name.clone(),
                    original_benchmark_name: record.original_benchmark_name.clone(),
                });
                report.scores_created += 1;
            }
            Err(err) => {
                warn!(record = %describe_score(record), %err, "score record skipped");
                report.failed.push(FailedRecord {
                    record: describe_score(record),
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        benchmarks = report.benchmarks_created,
        models = report.models_created,
        scores = report.scores_created,
        failed = report.failed.len(),
        "ingestion batch complete"
    );
    report
}

fn resolve_score(
    resolver: &Resolver,
    record: &RawScoreRecord,
) -> crate::error::Result<(i64, i64)> {
    let model_id = resolver.resolve_model(&record.original_model_name)?;
    let benchmark_id = resolver.resolve_benchmark(
        &record.original_benchmark_name,
        record.original_benchmark_variant.as_deref(),
    )?;
    Ok((model_id, benchmark_id))
}

fn describe_score(record: &RawScoreRecord) -> String {
    format!(
        "{} on {}",
        record.original_model_name, record.original_benchmark_name
    )
}

/// Audit column: the host part of the source URL, lower-cased.
fn source_host(url: &str) -> Option<String> {
    let rest = url.split("://").nth(1).unwrap_or(url);
    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}
