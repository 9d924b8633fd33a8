// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence-transformer wrapper
//!
//! Runs an ONNX export of a BERT-style sentence transformer
//! (all-MiniLM-L6-v2 by default):
//! - CUDA execution provider with automatic CPU fallback
//! - tokenization with truncation to `max_length`
//! - attention-masked mean pooling over token embeddings
//! - L2 normalization, matching sentence-transformers' `encode` output
//!
//! Everything here is synchronous and CPU/GPU bound. Callers on the async
//! runtime go through [`super::LocalEmbeddingProvider`], which moves the work
//! onto the blocking pool.

use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{info, warn};

use super::pooling::{l2_normalize, mean_pool};

/// Token ids, attention mask and token type ids for one input
struct EncodedInput {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
    mask: Vec<i64>,
}

/// Loaded ONNX embedding model
///
/// The session sits behind a `Mutex` because the runtime needs exclusive
/// access to run it; the tokenizer is read-only.
pub struct OnnxEmbeddingModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_name: String,
    dimension: usize,
    max_length: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk and validates the output shape
    ///
    /// # Errors
    /// - model or tokenizer file missing / unreadable
    /// - ONNX Runtime initialization fails
    /// - the validation inference does not produce `[batch, seq_len, dimension]`
    pub fn load(
        model_name: impl Into<String>,
        model_path: &Path,
        tokenizer_path: &Path,
        dimension: usize,
        max_length: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let session = build_session(model_path)?;
        info!("✅ ONNX embedding model loaded: {}", model_name);

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        // Single inputs never need padding
        tokenizer.with_padding(None);

        let model = Self {
            session: Mutex::new(session),
            tokenizer,
            model_name,
            dimension,
            max_length,
        };

        let sample = model
            .embed_blocking("validation test")
            .context("Model validation inference failed")?;
        info!(
            "Model {} validated: {} dimensions",
            model.model_name,
            sample.len()
        );

        Ok(model)
    }

    /// Computes the normalized sentence embedding of `text`
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let encoded = self.encode(text)?;

        let mut session = lock_session(&self.session);
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(encoded.input_ids)?,
            "attention_mask" => Value::from_array(encoded.attention_mask)?,
            "token_type_ids" => Value::from_array(encoded.token_type_ids)?
        ])?;

        // Output names differ between exports, index 0 is the token embeddings
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output.shape();
        if shape.len() != 3 || shape[2] != self.dimension {
            anyhow::bail!(
                "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, {}])",
                shape,
                self.dimension
            );
        }

        let tokens = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<ndarray::Ix2>()
            .context("Failed to view token embeddings")?;

        let mut embedding = mean_pool(tokens, &encoded.mask);
        l2_normalize(&mut embedding);

        Ok(embedding)
    }

    /// Number of real (non-padding) tokens the model would see for `text`
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoded = self.encode(text)?;
        Ok(encoded.mask.iter().filter(|&&m| m != 0).count())
    }

    fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        Ok(EncodedInput {
            input_ids: Array2::from_shape_vec((1, seq_len), input_ids)
                .context("Failed to create input_ids array")?,
            attention_mask: Array2::from_shape_vec((1, seq_len), mask.clone())
                .context("Failed to create attention_mask array")?,
            token_type_ids: Array2::zeros((1, seq_len)),
            mask,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Locks the session, recovering it if a previous holder panicked
///
/// A panic mid-request leaves no partial state in the session, so the next
/// request can use it as-is.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates the ONNX session, preferring CUDA and falling back to CPU
fn build_session(model_path: &Path) -> Result<Session> {
    info!("   Attempting CUDA execution provider...");
    let cuda_result = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path);

    match cuda_result {
        Ok(session) => {
            info!("✅ CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("⚠️  CUDA execution provider failed: {}", e);
            warn!("   Falling back to CPU execution provider");
            Session::builder()
                .context("Failed to create session builder")?
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .context("Failed to set optimization level")?
                .with_intra_threads(4)
                .context("Failed to set intra threads")?
                .commit_from_file(model_path)
                .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
        }
    }
}
