// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Imaginify API Server
//!
//! Receives Clerk webhooks and keeps the Firestore user collection in sync.

use anyhow::Context;
use imaginify_api::{
    config::Config,
    db,
    services::{ClerkClient, WebhookVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Imaginify API");

    let verifier = WebhookVerifier::new(&config.webhook_secret, config.webhook_tolerance_secs)
        .context("Invalid WEBHOOK_SECRET")?;

    let clerk = ClerkClient::new(
        config.clerk_api_url.clone(),
        config.clerk_secret_key.clone(),
    );

    // Firestore is connected on first use, once per process
    let users = db::firestore_cache(&config.firestore_project_id);
    tracing::info!(
        project = %config.firestore_project_id,
        "Firestore connection deferred until first request"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        users,
        clerk,
        verifier,
    });

    // Build router
    let app = imaginify_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("imaginify_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
