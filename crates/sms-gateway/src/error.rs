//! Error types for the SMS gateway client.

use thiserror::Error;

/// SMS gateway client errors.
#[derive(Debug, Error)]
pub enum SmsGatewayError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}
