/*!
 * HTTP service exposing the pipeline.
 *
 * Endpoints:
 * - `GET /health`
 * - `POST /translate-audio`: multipart upload → transcript and translation as JSON
 * - `POST /translate-and-synthesize`: multipart upload → translated speech as MP3
 *
 * Each request's run executes on its own task once a permit from the run pool
 * is available; collaborators are shared read-only across runs.
 */

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::app_config::{Config, ServerConfig};
use crate::pipeline::Pipeline;

pub mod error;
pub mod handlers;

pub use error::ApiError;

/// State shared by all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Bounds the number of concurrently executing runs
    pub runs: Arc<Semaphore>,
    /// Language used when a request omits `target_language`
    pub default_language: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, server: &ServerConfig, default_language: impl Into<String>) -> Self {
        Self {
            pipeline,
            runs: Arc::new(Semaphore::new(server.max_concurrent_runs.max(1))),
            default_language: default_language.into(),
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/translate-audio", post(handlers::translate_audio))
        .route("/translate-and-synthesize", post(handlers::translate_and_synthesize))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// Serve the API until Ctrl-C
pub async fn serve(config: &Config, host: &str, port: u16) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("Failed to set up the pipeline")?;
    let state = AppState::new(Arc::new(pipeline), &config.server, config.target_language.clone());

    let address = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(
        "LinguaWave API listening on http://{} ({} concurrent run(s))",
        listener.local_addr().context("Failed to read bound address")?,
        config.server.max_concurrent_runs
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("LinguaWave API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutdown requested, finishing in-flight requests");
}
