// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON body extractor whose rejections use the API error envelope.

use axum::extract::FromRequest;

use super::ApiError;

/// Like `axum::Json`, but a malformed or incomplete body becomes an
/// [`ApiError`] (HTTP 422) instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
