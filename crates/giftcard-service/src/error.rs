//! Error types for the gift card service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chain_ledger::LedgerClientError;
use serde::Serialize;
use thiserror::Error;
use verification_flow::FlowError;

/// Service error types.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Verification session not found: {0}")]
    SessionNotFound(String),

    #[error("Conflicting operation: {0}")]
    Conflict(String),

    #[error("No wallet bound to number")]
    NumberNotBound,

    #[error("Verification gateway error: {0}")]
    Gateway(String),

    #[error("Chain ledger error: {0}")]
    Ledger(String),

    #[error("Name resolver error: {0}")]
    Resolver(String),

    #[error("Upstream call exceeded its deadline")]
    DeadlineExceeded,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServiceError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ServiceError::NumberNotBound => (StatusCode::NOT_FOUND, "NUMBER_NOT_BOUND"),
            ServiceError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
            ServiceError::Ledger(_) => (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"),
            ServiceError::Resolver(_) => (StatusCode::BAD_GATEWAY, "RESOLVER_ERROR"),
            ServiceError::DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
            ServiceError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<FlowError> for ServiceError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::InvalidPhoneNumber(reason) => ServiceError::InvalidRequest(reason),
            FlowError::CallInFlight | FlowError::WrongStep(_) => {
                ServiceError::Conflict(e.to_string())
            }
            FlowError::Gateway(g) => ServiceError::Gateway(g.to_string()),
            FlowError::Ledger(l) => ServiceError::Ledger(l.to_string()),
            FlowError::DeadlineExceeded(_) => ServiceError::DeadlineExceeded,
        }
    }
}

impl From<LedgerClientError> for ServiceError {
    fn from(e: LedgerClientError) -> Self {
        match e {
            LedgerClientError::InvalidAddress(reason) => ServiceError::InvalidRequest(reason),
            LedgerClientError::NumberNotBound(_) => ServiceError::NumberNotBound,
            other => ServiceError::Ledger(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Resolver(e.to_string())
    }
}
