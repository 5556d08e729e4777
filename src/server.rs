//! Eligibility HTTP API
//!
//! `GET /` reports liveness; `POST /eligible_ccas` takes `{"address": ...}`
//! and answers with the eligible programs.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::directory::ZipDirectory;
use crate::eligibility::{parse_address, Matcher};
use crate::errors::ApiError;
use crate::models::{AddressRequest, CcaResult};
use crate::storage::Storage;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub directory: Arc<ZipDirectory>,
    pub matcher: Matcher,
}

impl AppState {
    pub fn new(storage: Storage, directory: ZipDirectory, matcher: Matcher) -> Self {
        Self {
            storage,
            directory: Arc::new(directory),
            matcher,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/eligible_ccas", post(eligible_ccas))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", bind_addr))?;
    info!("CCA Finder API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}

async fn read_root() -> Json<Value> {
    Json(json!({ "message": "CCA Finder API is running." }))
}

async fn eligible_ccas(
    State(state): State<AppState>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<Vec<CcaResult>>, ApiError> {
    let query = parse_address(&request.address, &state.directory);
    debug!("Parsed '{}' as {:?}", request.address, query);

    if query.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let catalog = state.storage.load_catalog().await?;
    let eligible = state.matcher.eligible(&query, &catalog);
    info!(
        "{} of {} programs eligible for '{}'",
        eligible.len(),
        catalog.len(),
        request.address
    );
    Ok(Json(eligible))
}
