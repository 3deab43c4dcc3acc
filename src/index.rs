//! Vector-similarity index over benchmark descriptions.
//!
//! Vectors are L2-normalized before indexing and before querying, so exact
//! inner-product search is equivalent to cosine similarity. Rebuild is
//! full-replace: every rebuild regenerates the whole index from the current
//! dictionary snapshot, trading rebuild cost for an index that is never
//! partially stale. Publishing writes to a temporary path and renames, so
//! readers keep the previous artifact until the new one is complete.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::{CompassError, Result};

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: i64,
    vector: Vec<f32>,
}

/// On-disk artifact. Records which embedding model produced the vectors so a
/// configuration change invalidates the artifact instead of silently serving
/// vectors from the wrong space.
#[derive(Debug, Serialize, Deserialize)]
struct IndexArtifact {
    version: u32,
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

#[derive(Debug)]
pub struct SemanticIndex {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl SemanticIndex {
    /// Build a fresh index over `(id, text)` pairs. All texts go to the
    /// provider in one batched request; a dimension mismatch aborts the whole
    /// build and leaves any previously published artifact untouched.
    pub fn build(provider: &dyn EmbeddingProvider, entries: &[(i64, String)]) -> Result<Self> {
        let texts: Vec<String> = entries.iter().map(|(_, text)| text.clone()).collect();
        let vectors = provider.embed(&texts)?;

        let entries = entries
            .iter()
            .zip(vectors)
            .map(|(&(id, _), mut vector)| {
                l2_normalize(&mut vector);
                IndexEntry { id, vector }
            })
            .collect::<Vec<_>>();

        info!(entries = entries.len(), "semantic index built");

        Ok(Self {
            embedding_model: provider.model_name().to_string(),
            dimension: provider.dimension(),
            entries,
        })
    }

    /// Nearest neighbors of a free-text query: up to `k` results, descending
    /// by cosine similarity, ties broken by entity id for determinism.
    pub fn search(
        &self,
        provider: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> Result<Vec<(i64, f32)>> {
        let mut query_vec = provider
            .embed(&[query.to_string()])?
            .into_iter()
            .next()
            .unwrap_or_default();
        l2_normalize(&mut query_vec);

        let mut scored: Vec<(i64, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry.id, dot(&entry.vector, &query_vec)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Atomic publish: serialize next to the target, then rename over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = IndexArtifact {
            version: ARTIFACT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            entries: self.entries.clone(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string(&artifact)?)?;
        std::fs::rename(&tmp, path)?;

        info!(path = %path.display(), "semantic index published");
        Ok(())
    }

    /// Load the published artifact. A missing file, an artifact produced by a
    /// different embedding model/dimension, or an older artifact version all
    /// surface as `IndexUnavailable` -- searching a stale or mismatched index
    /// is worse than asking for a rebuild.
    pub fn load(path: &Path, expected_model: &str, expected_dimension: usize) -> Result<Self> {
        if !path.exists() {
            return Err(CompassError::IndexUnavailable);
        }
        let contents = std::fs::read_to_string(path)?;
        let artifact: IndexArtifact = serde_json::from_str(&contents)?;

        if artifact.version != ARTIFACT_VERSION
            || artifact.embedding_model != expected_model
            || artifact.dimension != expected_dimension
        {
            return Err(CompassError::IndexUnavailable);
        }

        Ok(Self {
            embedding_model: artifact.embedding_model,
            dimension: artifact.dimension,
            entries: artifact.entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
