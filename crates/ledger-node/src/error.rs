use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::{LedgerError, PowError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// A request payload the node refuses. Rejected requests have no side effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing values: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Please supply a valid list of nodes")]
    MissingNodes,

    #[error("invalid node address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("malformed request body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Pow(#[from] PowError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to build peer client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("mining task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::Body(rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
