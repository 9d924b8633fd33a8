// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::embed::{embed_handler, query_to_embedding_handler};
use super::handlers::{health_handler, not_found_handler, root_handler};
use crate::config::ServiceConfig;
use crate::version;
use crate::embeddings::EmbeddingProvider;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn EmbeddingProvider>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: ServiceConfig) -> Self {
        Self {
            provider,
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .route("/query-to-embedding", post(query_to_embedding_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds `state.config.listen_addr` and serves until Ctrl-C
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.listen_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Embedding API listening on http://{}", listener.local_addr()?);
    info!("   Endpoints: {}", version::ENDPOINTS.join(", "));

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Embedding API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
