// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request bodies for the embedding endpoints

use serde::{Deserialize, Serialize};

/// Request body for `POST /embed`
///
/// `id` is opaque to the service and echoed back unchanged.
///
/// ```json
/// { "id": "42", "text": "hello world" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRequest {
    pub id: String,
    pub text: String,
}

/// Request body for `POST /query-to-embedding`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingQuery {
    pub text: String,
}
