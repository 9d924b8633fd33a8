// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! `POST /embed` and `POST /query-to-embedding`.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_handler, query_to_embedding_handler};
pub use request::{EmbeddingQuery, TextRequest};
pub use response::{EmbedResponse, QueryEmbeddingResponse};
