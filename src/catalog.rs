//! Catalog entities and raw ingestion records.
//!
//! The catalog proper (models, benchmarks, authoritative scores) is owned by
//! the storage layer; the engines here operate on a borrowed snapshot for the
//! duration of one ingestion or ranking pass and mutate nothing in place. The
//! JSON load/save helpers exist for the CLI, which stands in for that layer.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CompassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Slow,
    #[default]
    Medium,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    #[default]
    Any,
    Cloud,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkEntity {
    pub id: i64,
    pub name_normalized: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntity {
    pub id: i64,
    pub name_normalized: String,
    pub provider: String,
    #[serde(default)]
    pub parameter_count: Option<u64>,
    #[serde(default)]
    pub quantization: Option<String>,
    #[serde(default)]
    pub modality_input: Vec<Modality>,
    #[serde(default)]
    pub modality_output: Vec<Modality>,
    pub context_window: u64,
    pub cost_input_1m: f64,
    pub cost_output_1m: f64,
    #[serde(default)]
    pub speed_class: SpeedClass,
    #[serde(default)]
    pub speed_tps: Option<f64>,
    #[serde(default)]
    pub is_open_weights: bool,
    #[serde(default)]
    pub is_reasoning_model: bool,
    #[serde(default)]
    pub has_tool_calling: bool,
    #[serde(default)]
    pub is_outdated: bool,
    #[serde(default)]
    pub superseded_by: Option<i64>,
}

impl ModelEntity {
    pub fn context_str(&self) -> String {
        format_tokens(self.context_window)
    }

    pub fn cost_str(&self) -> String {
        format!(
            "{}/{}",
            cost_short(self.cost_input_1m),
            cost_short(self.cost_output_1m)
        )
    }
}

/// One authoritative measurement linking a model to a benchmark. At most one
/// per `(model_id, benchmark_id)`; estimated values never land here -- they
/// exist only in the working score matrix of a single ranking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub model_id: i64,
    pub benchmark_id: i64,
    pub score_value: f64,
    pub metric_unit: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub date_published: Option<NaiveDate>,
    pub original_model_name: String,
    pub original_benchmark_name: String,
}

/// Hard filters applied before any scoring work. Read-only per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default)]
    pub min_context_window: Option<u64>,
    #[serde(default)]
    pub modality_input: Vec<Modality>,
    #[serde(default)]
    pub modality_output: Vec<Modality>,
    #[serde(default)]
    pub deployment: Deployment,
    #[serde(default)]
    pub require_reasoning: bool,
    #[serde(default)]
    pub require_tool_calling: bool,
    #[serde(default)]
    pub min_speed_class: Option<SpeedClass>,
}

/// Caller-supplied prediction of the input/output token split. The engines
/// never renormalize it; a ratio that does not sum to 1.0 is a contract
/// violation surfaced before any ranking work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IoRatio {
    pub input: f64,
    pub output: f64,
}

impl IoRatio {
    const TOLERANCE: f64 = 1e-6;

    pub fn validate(self) -> std::result::Result<(), CompassError> {
        let sum = self.input + self.output;
        if (sum - 1.0).abs() > Self::TOLERANCE {
            return Err(CompassError::InvalidIoRatio { sum });
        }
        Ok(())
    }
}

/// Raw benchmark-dictionary record as produced by the ingestion transport.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBenchmarkRecord {
    pub name_normalized: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawModelRecord {
    pub name_normalized: String,
    pub provider: String,
    #[serde(default)]
    pub parameter_count: Option<u64>,
    #[serde(default)]
    pub quantization: Option<String>,
    #[serde(default)]
    pub modality_input: Vec<Modality>,
    #[serde(default)]
    pub modality_output: Vec<Modality>,
    pub context_window: u64,
    pub cost_input_1m: f64,
    pub cost_output_1m: f64,
    #[serde(default)]
    pub speed_class: SpeedClass,
    #[serde(default)]
    pub speed_tps: Option<f64>,
    #[serde(default)]
    pub is_open_weights: bool,
    #[serde(default)]
    pub is_reasoning_model: bool,
    #[serde(default)]
    pub has_tool_calling: bool,
    #[serde(default)]
    pub is_outdated: bool,
}

/// Raw score record. Model and benchmark are referenced by their original
/// human-typed names; resolution happens at ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScoreRecord {
    pub original_model_name: String,
    pub original_benchmark_name: String,
    #[serde(default)]
    pub original_benchmark_variant: Option<String>,
    pub score_value: f64,
    pub metric_unit: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub date_published: Option<NaiveDate>,
}

/// One ingestion batch as handed over by the transport layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub benchmarks: Vec<RawBenchmarkRecord>,
    #[serde(default)]
    pub models: Vec<RawModelRecord>,
    #[serde(default)]
    pub scores: Vec<RawScoreRecord>,
}

/// In-memory catalog snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkEntity>,
    #[serde(default)]
    pub models: Vec<ModelEntity>,
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse catalog file")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }
        let contents = serde_json::to_string(self).context("Failed to serialize catalog")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;
        Ok(())
    }

    pub fn model(&self, id: i64) -> Option<&ModelEntity> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn benchmark(&self, id: i64) -> Option<&BenchmarkEntity> {
        self.benchmarks.iter().find(|b| b.id == id)
    }

    pub fn next_benchmark_id(&self) -> i64 {
        self.benchmarks.iter().map(|b| b.id).max().unwrap_or(0) + 1
    }

    pub fn next_model_id(&self) -> i64 {
        self.models.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }
}

fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        let m = n as f64 / 1_000_000.0;
        if m.fract() == 0.0 {
            format!("{}M", m as u64)
        } else {
            format!("{:.1}M", m)
        }
    } else if n >= 1_000 {
        let k = n as f64 / 1_000.0;
        if k.fract() == 0.0 {
            format!("{}k", k as u64)
        } else {
            format!("{:.1}k", k)
        }
    } else {
        n.to_string()
    }
}

/// Compact cost string for list columns.
pub fn cost_short(value: f64) -> String {
    if value >= 100.0 {
        format!("${:.0}", value)
    } else if value >= 1.0 {
        format!("${:.1}", value)
    } else if value >= 0.01 {
        format!("${:.2}", value)
    } else {
        format!("${:.3}", value)
    }
}
