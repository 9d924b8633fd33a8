// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod json;

pub use embed::{
    embed_handler, query_to_embedding_handler, EmbedResponse, EmbeddingQuery,
    QueryEmbeddingResponse, TextRequest,
};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, WelcomeResponse};
pub use http_server::{create_app, start_server, AppState};
pub use json::ApiJson;
