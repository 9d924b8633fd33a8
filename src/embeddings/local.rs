// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process embedding provider backed by [`OnnxEmbeddingModel`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use hf_hub::api::tokio::ApiBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{EmbeddingError, EmbeddingProvider, OnnxEmbeddingModel};
use crate::config::{ProviderKind, ServiceConfig};

const HUB_MODEL_FILE: &str = "onnx/model.onnx";
const HUB_TOKENIZER_FILE: &str = "tokenizer.json";

/// Synchronous text-to-vector model run by [`LocalEmbeddingProvider`]
pub trait SentenceEncoder: Send + Sync {
    fn encode_sentence(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

impl SentenceEncoder for OnnxEmbeddingModel {
    fn encode_sentence(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_blocking(text)
    }

    fn dimension(&self) -> usize {
        OnnxEmbeddingModel::dimension(self)
    }
}

/// Local ONNX provider
///
/// The model is loaded once and shared read-only for the life of the process.
/// Each `embed` call runs on Tokio's blocking pool so inference never stalls
/// request handling.
#[derive(Clone)]
pub struct LocalEmbeddingProvider {
    model: Arc<dyn SentenceEncoder>,
    model_id: String,
}

impl std::fmt::Debug for LocalEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbeddingProvider")
            .field("model_id", &self.model_id)
            .field("dimension", &self.model.dimension())
            .finish()
    }
}

impl LocalEmbeddingProvider {
    pub fn new(model: Arc<dyn SentenceEncoder>, model_id: impl Into<String>) -> Self {
        Self {
            model,
            model_id: model_id.into(),
        }
    }

    /// Resolves model files (configured paths or hub download) and loads the model
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = resolve_model_files(config).await?;
        let model_id = config.model_id.clone();
        let dimension = config.local.dimensions;
        let max_length = config.local.max_length;

        info!(
            "Loading embedding model {} from {}",
            model_id,
            model_path.display()
        );

        let name = model_id.clone();
        let model = tokio::task::spawn_blocking(move || {
            OnnxEmbeddingModel::load(name, &model_path, &tokenizer_path, dimension, max_length)
        })
        .await
        .context("Model loading task failed")??;

        Ok(Self::new(Arc::new(model), model_id))
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        let embedding = tokio::task::spawn_blocking(move || model.encode_sentence(&text))
            .await
            .map_err(|e| EmbeddingError::Inference(format!("inference worker failed: {}", e)))?
            .map_err(|e| EmbeddingError::Inference(format!("{:#}", e)))?;

        debug!("Local embedding computed: {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}

/// Uses the configured paths, or fetches the files from the model's hub repository
async fn resolve_model_files(config: &ServiceConfig) -> Result<(PathBuf, PathBuf)> {
    if let (Some(model_path), Some(tokenizer_path)) =
        (&config.local.model_path, &config.local.tokenizer_path)
    {
        return Ok((model_path.clone(), tokenizer_path.clone()));
    }

    info!(
        "No local model paths configured, fetching {} from the hub",
        config.model_id
    );

    let api = ApiBuilder::new()
        .with_token(config.bearer_token().map(str::to_string))
        .with_progress(false)
        .build()
        .map_err(|e| anyhow!("Failed to create hub client: {}", e))?;
    let repo = api.model(config.model_id.clone());

    let model_path = repo
        .get(HUB_MODEL_FILE)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", HUB_MODEL_FILE, config.model_id))?;
    let tokenizer_path = repo
        .get(HUB_TOKENIZER_FILE)
        .await
        .with_context(|| {
            format!("Failed to fetch {} from {}", HUB_TOKENIZER_FILE, config.model_id)
        })?;

    Ok((model_path, tokenizer_path))
}
