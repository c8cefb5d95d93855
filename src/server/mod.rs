//! HTTP boundary: forwards ticket text to the engine and returns its answer as JSON.


use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::engine::{EngineMode, RetrievalEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RetrievalEngine>,
    pub model: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct Ticket {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model: String,
    pub mode: EngineMode,
    pub documents: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[inline]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/recommend", post(recommend_content))
        .with_state(state)
}

/// Bind `address` and serve until ctrl-c
#[inline]
pub async fn serve(state: AppState, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(
        "Serving recommendations on http://{} ({} mode)",
        listener.local_addr().context("Listener has no local address")?,
        state.engine.mode()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Received interrupt signal, shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "active",
        model: state.model.to_string(),
        mode: state.engine.mode(),
        documents: state.engine.corpus_len(),
    })
}

async fn recommend_content(
    State(state): State<AppState>,
    Json(ticket): Json<Ticket>,
) -> Result<Json<Recommendations>, ApiError> {
    debug!("Received ticket ({} chars)", ticket.content.len());

    // Semantic queries block on the embedding backend
    let engine = Arc::clone(&state.engine);
    let recommendations = tokio::task::spawn_blocking(move || engine.recommend(&ticket.content))
        .await
        .map_err(|e| {
            error!("Recommendation task failed: {}", e);
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: e.to_string(),
            }
        })?;

    Ok(Json(Recommendations { recommendations }))
}
