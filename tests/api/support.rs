// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared helpers: a counting fake provider, a fake inference API and
//! request/response plumbing for driving the router with `oneshot`.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use embedding_api_node::{
    api::{create_app, AppState},
    config::{ProviderKind, ServiceConfig},
    embeddings::{EmbeddingError, EmbeddingProvider},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Provider that returns a fixed-size vector and counts calls
pub struct CountingProvider {
    pub kind: ProviderKind,
    pub dimensions: usize,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl CountingProvider {
    pub fn healthy(dimensions: usize) -> Arc<Self> {
        Arc::new(Self {
            kind: ProviderKind::Local,
            dimensions,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            dimensions: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Inference("simulated failure".to_string()));
        }
        Ok((0..self.dimensions).map(|i| i as f32 / 1000.0).collect())
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

pub fn app_with(provider: Arc<dyn EmbeddingProvider>) -> Router {
    create_app(AppState::new(provider, ServiceConfig::default()))
}

pub fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Sends one request through the router and decodes the JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// What the fake inference API saw
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

/// Canned behaviour of the fake inference API
#[derive(Clone)]
pub struct UpstreamBehavior {
    pub status: StatusCode,
    pub body: serde_json::Value,
    pub delay: Duration,
}

#[derive(Clone)]
struct UpstreamState {
    behavior: UpstreamBehavior,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct FakeUpstream {
    pub base_url: String,
    pub captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

async fn upstream_handler(
    State(state): State<UpstreamState>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.captured.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if !state.behavior.delay.is_zero() {
        tokio::time::sleep(state.behavior.delay).await;
    }

    (state.behavior.status, Json(state.behavior.body.clone())).into_response()
}

/// Starts a fake feature-extraction API on an ephemeral port
pub async fn spawn_upstream(behavior: UpstreamBehavior) -> FakeUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = UpstreamState {
        behavior,
        captured: captured.clone(),
    };

    let app = Router::new()
        .route("/pipeline/feature-extraction/*model", post(upstream_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeUpstream {
        base_url: format!("http://{}/pipeline/feature-extraction", addr),
        captured,
    }
}

/// Config pointing the remote provider at `upstream`
pub fn remote_config(upstream: &FakeUpstream, token: Option<&str>) -> ServiceConfig {
    let mut config = ServiceConfig {
        provider: ProviderKind::Remote,
        hf_token: token.map(str::to_string),
        ..Default::default()
    };
    config.remote.api_base_url = upstream.base_url.clone();
    config
}
