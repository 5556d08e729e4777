//! Error types for the eligibility client and the API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures talking to the eligibility API
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Eligibility API error (status {status_code})")]
    Status { status_code: u16 },
}

/// Failures inside the API server, rendered as HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self);
        let body = Json(json!({ "detail": "Internal server error" }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
