// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    LocalModelConfig, ProviderKind, RemoteProviderConfig, ServiceConfig, DEFAULT_API_BASE_URL,
    DEFAULT_DIMENSIONS, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_LENGTH, DEFAULT_MODEL_ID,
    DEFAULT_TIMEOUT_SECS, DEFAULT_WELCOME_MESSAGE,
};

/// Embedding API Node
///
/// Every flag can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[command(name = "embedding-api-node")]
#[command(version)]
#[command(about = "HTTP service that turns text into embedding vectors", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "API_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Embedding backend (remote inference API or local ONNX model)
    #[arg(long, env = "EMBEDDING_PROVIDER", value_enum, default_value_t = ProviderKind::Remote)]
    pub provider: ProviderKind,

    /// Bearer token for the inference API (can also be set via HF_TOKEN env var)
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Model identifier (inference API model / hub repository)
    #[arg(long, env = "EMBEDDING_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Feature-extraction pipeline base URL
    #[arg(long, env = "EMBEDDING_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Timeout for the outbound inference call, in seconds
    #[arg(long, env = "EMBEDDING_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Ask the inference API to wait for a cold model instead of failing
    #[arg(
        long,
        env = "EMBEDDING_WAIT_FOR_MODEL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub wait_for_model: bool,

    /// Path to a local model.onnx (local provider)
    #[arg(long, env = "EMBEDDING_MODEL_PATH", requires = "tokenizer_path")]
    pub model_path: Option<PathBuf>,

    /// Path to a local tokenizer.json (local provider)
    #[arg(long, env = "EMBEDDING_TOKENIZER_PATH", requires = "model_path")]
    pub tokenizer_path: Option<PathBuf>,

    /// Expected embedding dimensions of the local model
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_DIMENSIONS)]
    pub dimensions: usize,

    /// Message returned by GET /
    #[arg(long, env = "WELCOME_MESSAGE", default_value = DEFAULT_WELCOME_MESSAGE)]
    pub welcome_message: String,
}

impl Cli {
    pub fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            listen_addr: self.listen_addr,
            provider: self.provider,
            model_id: self.model_id,
            hf_token: self.hf_token,
            welcome_message: self.welcome_message,
            remote: RemoteProviderConfig {
                api_base_url: self.api_base_url,
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                wait_for_model: self.wait_for_model,
            },
            local: LocalModelConfig {
                model_path: self.model_path,
                tokenizer_path: self.tokenizer_path,
                dimensions: self.dimensions,
                max_length: DEFAULT_MAX_LENGTH,
            },
        }
    }
}
