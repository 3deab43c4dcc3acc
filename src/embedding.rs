//! Embedding provider boundary.
//!
//! The index build batches every text of one rebuild into a single provider
//! request. Calls are blocking and synchronous; retry policy belongs to the
//! caller, not this client. A response whose vector width disagrees with the
//! configured dimension fails the whole operation -- no truncation or padding.

use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{CompassError, Result};

pub trait EmbeddingProvider {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;
}

/// OpenRouter-compatible `/embeddings` client.
pub struct OpenRouterEmbeddings {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
}

impl OpenRouterEmbeddings {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("modelcompass")
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

impl EmbeddingProvider for OpenRouterEmbeddings {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let payload = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?
            .error_for_status()?;

        let body: EmbedResponse = response.json()?;
        let vectors: Vec<Vec<f32>> = body.data.into_iter().map(|item| item.embedding).collect();

        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(CompassError::EmbeddingDimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
