// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding providers
//!
//! The router only sees [`EmbeddingProvider`]; which implementation backs it
//! is decided once at startup by [`build_provider`].

pub mod local;
pub mod onnx_model;
pub mod pooling;
pub mod remote;

pub use local::{LocalEmbeddingProvider, SentenceEncoder};
pub use onnx_model::OnnxEmbeddingModel;
pub use remote::RemoteEmbeddingProvider;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ProviderKind, ServiceConfig};

/// Errors produced while computing an embedding
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// No bearer token configured; raised before any network activity
    #[error("No bearer token configured for the remote embedding provider")]
    MissingToken,

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}: {body}")]
    Upstream {
        /// HTTP status code from the inference API
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Connection or protocol failure talking to the upstream
    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Upstream succeeded but the payload is not a usable vector
    #[error("Unexpected upstream response: {0}")]
    MalformedResponse(String),

    /// Local model failed (tokenization, inference or worker failure)
    #[error("Embedding inference failed: {0}")]
    Inference(String),
}

/// A backend that turns one text into one embedding vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Which strategy this provider implements
    fn kind(&self) -> ProviderKind;

    /// Model identifier used for logging and health reporting
    fn model(&self) -> &str;
}

/// Builds the provider selected by `config.provider`
///
/// The local provider loads (and if needed downloads) its model here, so
/// this can take a while on first start.
pub async fn build_provider(config: &ServiceConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        ProviderKind::Remote => {
            if config.bearer_token().is_none() {
                warn!("⚠️  HF_TOKEN is not set; embedding requests will fail until it is configured");
            }
            let provider = RemoteEmbeddingProvider::from_config(config)
                .context("Failed to create remote embedding provider")?;
            info!(
                "Using remote embedding provider: {}",
                provider.endpoint()
            );
            Ok(Arc::new(provider))
        }
        ProviderKind::Local => {
            let provider = LocalEmbeddingProvider::from_config(config)
                .await
                .context("Failed to load local embedding model")?;
            info!(
                "Using local embedding provider: {} ({} dimensions)",
                provider.model(),
                provider.dimension()
            );
            Ok(Arc::new(provider))
        }
    }
}
