// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Remote provider tests against a fake feature-extraction API
//!
//! Verifies the outbound request (URL, bearer token, body), status mapping
//! for upstream failures, the missing-token short circuit and timeouts.

use super::support::{
    get, json_post, remote_config, send, spawn_upstream, UpstreamBehavior,
};
use axum::http::StatusCode;
use embedding_api_node::{
    api::{create_app, AppState},
    embeddings::{build_provider, EmbeddingError, EmbeddingProvider, RemoteEmbeddingProvider},
};
use std::time::Duration;

fn ok_vector(dimensions: usize) -> UpstreamBehavior {
    let vector: Vec<f32> = (0..dimensions).map(|i| i as f32 * 0.001).collect();
    UpstreamBehavior {
        status: StatusCode::OK,
        body: serde_json::json!(vector),
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_outbound_request_shape() {
    let upstream = spawn_upstream(ok_vector(384)).await;
    let config = remote_config(&upstream, Some("hf_test_token"));
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let embedding = provider.embed("hello world").await.unwrap();
    assert_eq!(embedding.len(), 384);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].path,
        "/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
    );
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer hf_test_token")
    );
    assert_eq!(
        requests[0].body,
        serde_json::json!({"inputs": "hello world", "options": {"wait_for_model": true}})
    );
}

#[tokio::test]
async fn test_embed_end_to_end_through_router() {
    let upstream = spawn_upstream(ok_vector(384)).await;
    let config = remote_config(&upstream, Some("hf_test_token"));
    let provider = build_provider(&config).await.unwrap();
    let app = create_app(AppState::new(provider, config));

    let (status, body) = send(
        app,
        json_post("/embed", r#"{"id":"42","text":"hello world"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "42");
    assert_eq!(body["embedding"].as_array().unwrap().len(), 384);
}

#[tokio::test]
async fn test_token_rows_are_pooled_to_flat_vector() {
    let upstream = spawn_upstream(UpstreamBehavior {
        status: StatusCode::OK,
        body: serde_json::json!([[3.0, 0.0, 0.0], [3.0, 8.0, 0.0]]),
        delay: Duration::ZERO,
    })
    .await;
    let config = remote_config(&upstream, Some("hf_test_token"));
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let embedding = provider.embed("two tokens").await.unwrap();
    // mean [3, 4, 0] scaled to unit length
    let expected = [0.6f32, 0.8, 0.0];
    assert_eq!(embedding.len(), expected.len());
    for (actual, expected) in embedding.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-6, "{:?}", embedding);
    }
}

#[tokio::test]
async fn test_missing_token_is_500_without_outbound_call() {
    let upstream = spawn_upstream(ok_vector(384)).await;
    let config = remote_config(&upstream, None);
    let provider = build_provider(&config).await.unwrap();
    let app = create_app(AppState::new(provider, config));

    let (status, body) = send(
        app.clone(),
        json_post("/embed", r#"{"id":"1","text":"hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "configuration_error");

    let (status, _) = send(
        app.clone(),
        json_post("/query-to-embedding", r#"{"text":"hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Root still answers without a token
    let (status, _) = send(app, get("/")).await;
    assert_eq!(status, StatusCode::OK);

    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_upstream_error_is_502_with_detail() {
    let upstream = spawn_upstream(UpstreamBehavior {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: serde_json::json!({"error": "Model is currently loading"}),
        delay: Duration::ZERO,
    })
    .await;
    let config = remote_config(&upstream, Some("hf_test_token"));
    let provider = build_provider(&config).await.unwrap();
    let app = create_app(AppState::new(provider, config));

    let (status, body) = send(
        app.clone(),
        json_post("/query-to-embedding", r#"{"text":"hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_type"], "provider_error");
    assert_eq!(body["details"]["upstream_status"], 503);
    assert!(body["details"]["upstream_body"]
        .as_str()
        .unwrap()
        .contains("Model is currently loading"));

    // Process keeps serving
    let (status, _) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unauthorized_upstream_is_502() {
    let upstream = spawn_upstream(UpstreamBehavior {
        status: StatusCode::UNAUTHORIZED,
        body: serde_json::json!({"error": "Invalid credentials in Authorization header"}),
        delay: Duration::ZERO,
    })
    .await;
    let config = remote_config(&upstream, Some("hf_bad_token"));
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Upstream { status: 401, .. }));
}

#[tokio::test]
async fn test_unexpected_upstream_shape_is_rejected() {
    let upstream = spawn_upstream(UpstreamBehavior {
        status: StatusCode::OK,
        body: serde_json::json!({"embeddings": "not a vector"}),
        delay: Duration::ZERO,
    })
    .await;
    let config = remote_config(&upstream, Some("hf_test_token"));
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let upstream = spawn_upstream(UpstreamBehavior {
        delay: Duration::from_secs(3),
        ..ok_vector(4)
    })
    .await;
    let mut config = remote_config(&upstream, Some("hf_test_token"));
    config.remote.request_timeout = Duration::from_secs(1);
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Timeout { secs: 1 }));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let mut config = embedding_api_node::ServiceConfig {
        hf_token: Some("hf_test_token".to_string()),
        ..Default::default()
    };
    // Port 1 on localhost refuses connections
    config.remote.api_base_url = "http://127.0.0.1:1/pipeline/feature-extraction".to_string();
    let provider = RemoteEmbeddingProvider::from_config(&config).unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Transport(_)));
}
