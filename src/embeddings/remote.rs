// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote feature-extraction provider
//!
//! Posts `{"inputs": text, "options": {"wait_for_model": ..}}` to the hosted
//! inference pipeline with a bearer token and decodes the returned features
//! into one flat vector.

use async_trait::async_trait;
use ndarray::Array2;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::pooling::{l2_normalize, mean_pool};
use super::{EmbeddingError, EmbeddingProvider};
use crate::config::{ProviderKind, ServiceConfig};

/// Hosted inference API provider
pub struct RemoteEmbeddingProvider {
    client: Client,
    endpoint: String,
    model_id: String,
    token: Option<String>,
    timeout: Duration,
    wait_for_model: bool,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: FeatureExtractionOptions,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionOptions {
    wait_for_model: bool,
}

/// Shapes the pipeline returns for a single string input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionOutput {
    /// Already pooled sentence embedding
    Sentence(Vec<f32>),
    /// One row per token, or a batch with a single pooled row
    Rows(Vec<Vec<f32>>),
    /// Batch of one, one row per token
    BatchedRows(Vec<Vec<Vec<f32>>>),
}

impl RemoteEmbeddingProvider {
    /// Creates the provider and its pooled HTTP client
    ///
    /// A missing token is accepted here and reported on each `embed` call.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, EmbeddingError> {
        let timeout = config.remote.request_timeout;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.remote_endpoint(),
            model_id: config.model_id.clone(),
            token: config.bearer_token().map(str::to_string),
            timeout,
            wait_for_model: config.remote.wait_for_model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let token = self.token.as_deref().ok_or(EmbeddingError::MissingToken)?;

        let body = FeatureExtractionRequest {
            inputs: text,
            options: FeatureExtractionOptions {
                wait_for_model: self.wait_for_model,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    EmbeddingError::Transport(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Inference API returned {} for {}", status, self.model_id);
            return Err(EmbeddingError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let output: FeatureExtractionOutput = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                EmbeddingError::MalformedResponse(format!("JSON parse error: {}", e))
            }
        })?;

        let embedding = flatten_output(output)?;
        debug!("Remote embedding received: {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}

/// Reduces any accepted pipeline shape to one sentence vector
fn flatten_output(output: FeatureExtractionOutput) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = match output {
        FeatureExtractionOutput::Sentence(vector) => vector,
        FeatureExtractionOutput::Rows(rows) => pool_rows(rows)?,
        FeatureExtractionOutput::BatchedRows(mut batch) => {
            if batch.len() != 1 {
                return Err(EmbeddingError::MalformedResponse(format!(
                    "expected features for 1 input, got {}",
                    batch.len()
                )));
            }
            pool_rows(batch.remove(0))?
        }
    };

    if embedding.is_empty() {
        return Err(EmbeddingError::MalformedResponse(
            "empty embedding".to_string(),
        ));
    }

    Ok(embedding)
}

/// Single row is returned as-is; several rows are per-token features
///
/// Token features are mean pooled and L2 normalized so the result is on the
/// same scale as the local model's output.
pub fn pool_rows(mut rows: Vec<Vec<f32>>) -> Result<Vec<f32>, EmbeddingError> {
    match rows.len() {
        0 => Err(EmbeddingError::MalformedResponse(
            "empty feature matrix".to_string(),
        )),
        1 => Ok(rows.remove(0)),
        seq_len => {
            let hidden_dim = rows[0].len();
            if rows.iter().any(|row| row.len() != hidden_dim) {
                return Err(EmbeddingError::MalformedResponse(
                    "token feature rows have different lengths".to_string(),
                ));
            }
            let flat: Vec<f32> = rows.into_iter().flatten().collect();
            let matrix = Array2::from_shape_vec((seq_len, hidden_dim), flat)
                .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
            let mask = vec![1i64; seq_len];
            let mut pooled = mean_pool(matrix.view(), &mask);
            l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }
}
