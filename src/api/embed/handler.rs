// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding endpoint handlers
//!
//! Both endpoints delegate the text to the configured provider; they differ
//! only in whether an id is echoed back.

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, warn};

use super::{EmbedResponse, EmbeddingQuery, QueryEmbeddingResponse, TextRequest};
use crate::api::http_server::AppState;
use crate::api::{ApiError, ApiJson};

/// POST /embed
///
/// # Errors
/// - 422: body is not JSON or misses `id` / `text`
/// - 500: provider misconfigured (no token) or local inference failed
/// - 502: remote inference API failed or timed out
pub async fn embed_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TextRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    debug!("Embed request received for id {}", request.id);

    let embedding = compute_embedding(&state, &request.text).await?;

    Ok(Json(EmbedResponse {
        id: request.id,
        embedding,
    }))
}

/// POST /query-to-embedding
pub async fn query_to_embedding_handler(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<EmbeddingQuery>,
) -> Result<Json<QueryEmbeddingResponse>, ApiError> {
    let embedding = compute_embedding(&state, &query.text).await?;
    Ok(Json(QueryEmbeddingResponse { embedding }))
}

async fn compute_embedding(state: &AppState, text: &str) -> Result<Vec<f32>, ApiError> {
    let provider = &state.provider;
    let started = Instant::now();

    match provider.embed(text).await {
        Ok(embedding) => {
            debug!(
                "Embedding computed by {} provider: {} dimensions, {}ms",
                provider.kind(),
                embedding.len(),
                started.elapsed().as_millis()
            );
            Ok(embedding)
        }
        Err(e) => {
            warn!("{} provider failed for {}: {}", provider.kind(), provider.model(), e);
            Err(ApiError::from_provider(provider.kind(), e))
        }
    }
}
