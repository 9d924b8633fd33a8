// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response bodies for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Response body for `POST /embed`
///
/// ```json
/// { "id": "42", "embedding": [0.1, 0.2, ...] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    /// Caller-supplied id, unchanged
    pub id: String,
    /// Flat sentence embedding; length fixed by the model (384 for all-MiniLM-L6-v2)
    pub embedding: Vec<f32>,
}

/// Response body for `POST /query-to-embedding`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryEmbeddingResponse {
    pub embedding: Vec<f32>,
}
