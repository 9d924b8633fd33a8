// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use embedding_api_node::{
    api::{start_server, AppState},
    build_provider,
    cli::Cli,
    version,
};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = Cli::parse().into_config();

    info!("🚀 Starting {}", version::get_version_string());

    if let Err(e) = config.validate() {
        error!("❌ Invalid configuration: {}", e);
        return Err(anyhow!("Invalid configuration: {}", e));
    }

    info!(
        "Provider: {}, model: {}",
        config.provider, config.model_id
    );

    let provider = build_provider(&config)
        .await
        .context("Failed to initialize embedding provider")?;
    info!("✅ Embedding provider ready");

    start_server(AppState::new(provider, config)).await
}
