// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::schools::OverlayError;
use crate::services::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Degenerate range: {0}")]
    DegenerateRange(String),

    #[error("Not ready: {0}")]
    Conflict(String),

    #[error("Failed to fetch source: {0}")]
    FetchFailed(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownRegion(_) | SessionError::UnknownMetric(_) => {
                AppError::NotFound(err.to_string())
            }
            SessionError::NotReady | SessionError::NoActiveMetric => {
                AppError::Conflict(err.to_string())
            }
            SessionError::Fetch(e) => AppError::FetchFailed(e.to_string()),
            SessionError::Malformed(e) => AppError::MalformedInput(e.to_string()),
            SessionError::Scale(e) => AppError::DegenerateRange(e.to_string()),
            SessionError::Render(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<OverlayError> for AppError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::AlreadyLoaded => AppError::Conflict(err.to_string()),
            OverlayError::ParseError(_) | OverlayError::NotFeatureCollection => {
                AppError::MalformedInput(err.to_string())
            }
            OverlayError::Fetch(e) => AppError::FetchFailed(e.to_string()),
            OverlayError::Render(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::DegenerateRange(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "degenerate_range",
                Some(msg.clone()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "not_ready", Some(msg.clone())),
            AppError::FetchFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "fetch_failed", Some(msg.clone()))
            }
            AppError::MalformedInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "malformed_input",
                Some(msg.clone()),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
