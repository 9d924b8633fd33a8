// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! A single [`ServiceConfig`] is built once at startup (see `cli`) and shared
//! read-only with the router and the embedding provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_API_BASE_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DIMENSIONS: usize = 384;
pub const DEFAULT_MAX_LENGTH: usize = 256;
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Welcome to the text embedding API. Use the /embed endpoint to get embeddings for your text.";

/// Which backend produces embeddings for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted feature-extraction API called over HTTP with a bearer token
    Remote,
    /// ONNX sentence-transformer loaded in-process
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Remote => "remote",
            ProviderKind::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings used only by the remote provider
#[derive(Debug, Clone)]
pub struct RemoteProviderConfig {
    /// Feature-extraction pipeline base URL; the model id is appended
    pub api_base_url: String,
    /// Bound on the whole outbound call
    pub request_timeout: Duration,
    /// Ask the inference API to block while a cold model loads
    pub wait_for_model: bool,
}

/// Settings used only by the local provider
#[derive(Debug, Clone)]
pub struct LocalModelConfig {
    /// Path to model.onnx; downloaded from the hub when unset
    pub model_path: Option<PathBuf>,
    /// Path to tokenizer.json; downloaded from the hub when unset
    pub tokenizer_path: Option<PathBuf>,
    /// Expected hidden size of the model output
    pub dimensions: usize,
    /// Token limit applied before inference
    pub max_length: usize,
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub provider: ProviderKind,
    /// Hub repository / inference model identifier
    pub model_id: String,
    /// Bearer token for the inference API (and private hub repos)
    pub hf_token: Option<String>,
    pub welcome_message: String,
    pub remote: RemoteProviderConfig,
    pub local: LocalModelConfig,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field("welcome_message", &self.welcome_message)
            .field("remote", &self.remote)
            .field("local", &self.local)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            provider: ProviderKind::Remote,
            model_id: DEFAULT_MODEL_ID.to_string(),
            hf_token: None,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            remote: RemoteProviderConfig {
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                wait_for_model: true,
            },
            local: LocalModelConfig {
                model_path: None,
                tokenizer_path: None,
                dimensions: DEFAULT_DIMENSIONS,
                max_length: DEFAULT_MAX_LENGTH,
            },
        }
    }
}

impl ServiceConfig {
    /// Full URL of the remote feature-extraction endpoint
    pub fn remote_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.remote.api_base_url.trim_end_matches('/'),
            self.model_id.trim_start_matches('/')
        )
    }

    /// Returns the token only if it is present and non-blank
    pub fn bearer_token(&self) -> Option<&str> {
        self.hf_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Validate the configuration
    ///
    /// A missing bearer token is deliberately not an error here: the remote
    /// provider reports it per request.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.trim().is_empty() {
            return Err("Listen address must not be empty".to_string());
        }
        if self.model_id.trim().is_empty() {
            return Err("Model id must not be empty".to_string());
        }
        if self.remote.request_timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }
        let base = self.remote.api_base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(format!("API base URL must be http(s), got '{}'", base));
        }
        if self.local.dimensions == 0 {
            return Err("Embedding dimensions must be greater than 0".to_string());
        }
        if self.local.max_length == 0 {
            return Err("Max sequence length must be greater than 0".to_string());
        }
        if self.local.model_path.is_some() != self.local.tokenizer_path.is_some() {
            return Err(
                "Model path and tokenizer path must be provided together".to_string(),
            );
        }
        Ok(())
    }
}
