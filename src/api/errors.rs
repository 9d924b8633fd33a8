// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::ProviderKind;
use crate::embeddings::EmbeddingError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    /// Body is not JSON, has the wrong content type, or cannot be read
    InvalidRequest(String),
    /// Body is JSON but does not match the expected shape
    ValidationError {
        field: String,
        message: String,
    },
    /// Body exceeds the request size limit
    PayloadTooLarge(String),
    /// Required server configuration is missing
    ConfigurationError(String),
    /// The embedding backend failed to produce a vector
    ProviderError {
        provider: ProviderKind,
        message: String,
        upstream_status: Option<u16>,
        detail: Option<String>,
    },
}

impl ApiError {
    /// Maps a provider failure onto the HTTP taxonomy
    ///
    /// Missing credentials are a server configuration problem; everything
    /// else is a provider failure tagged with the strategy that produced it.
    pub fn from_provider(provider: ProviderKind, err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::MissingToken => ApiError::ConfigurationError(err.to_string()),
            EmbeddingError::Upstream { status, body } => ApiError::ProviderError {
                provider,
                message: "Embedding provider returned an error".to_string(),
                upstream_status: Some(status),
                detail: Some(body),
            },
            other => ApiError::ProviderError {
                provider,
                message: other.to_string(),
                upstream_status: None,
                detail: None,
            },
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone(), None),
            ApiError::ConfigurationError(msg) => ("configuration_error", msg.clone(), None),
            ApiError::ProviderError {
                provider,
                message,
                upstream_status,
                detail,
            } => {
                let mut details = HashMap::new();
                details.insert(
                    "provider".to_string(),
                    serde_json::Value::String(provider.to_string()),
                );
                if let Some(status) = upstream_status {
                    details.insert(
                        "upstream_status".to_string(),
                        serde_json::Value::Number((*status).into()),
                    );
                }
                if let Some(detail) = detail {
                    details.insert(
                        "upstream_body".to_string(),
                        serde_json::Value::String(detail.clone()),
                    );
                }
                ("provider_error", message.clone(), Some(details))
            }
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    /// Upstream failures are 502; local failures and misconfiguration are 500
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 422,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::ConfigurationError(_) => 500,
            ApiError::ProviderError {
                provider: ProviderKind::Remote,
                ..
            } => 502,
            ApiError::ProviderError {
                provider: ProviderKind::Local,
                ..
            } => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            ApiError::ProviderError {
                provider,
                message,
                upstream_status,
                ..
            } => match upstream_status {
                Some(status) => write!(
                    f,
                    "Provider error ({}): {} (upstream status {})",
                    provider, message, status
                ),
                None => write!(f, "Provider error ({}): {}", provider, message),
            },
        }
    }
}

impl std::error::Error for ApiError {}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                ApiError::ValidationError {
                    field: field_from_message(&message).unwrap_or_else(|| "body".to_string()),
                    message,
                }
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge(other.body_text())
            }
            other => ApiError::InvalidRequest(other.body_text()),
        }
    }
}

/// Pulls the offending field out of a serde error message
///
/// Handles ``missing field `text` `` and path-prefixed errors such as
/// ``text: invalid type: integer `123`, expected a string``.
fn field_from_message(message: &str) -> Option<String> {
    const MISSING: &str = "missing field `";
    const PREFIX: &str = "target type: ";

    if let Some(start) = message.find(MISSING) {
        let rest = &message[start + MISSING.len()..];
        return rest.find('`').map(|end| rest[..end].to_string());
    }

    let detail = match message.find(PREFIX) {
        Some(start) => &message[start + PREFIX.len()..],
        None => message,
    };
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self.to_response())).into_response()
    }
}
