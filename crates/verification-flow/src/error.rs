//! Error types for the verification flow.

use std::time::Duration;
use thiserror::Error;

/// Opaque failure from the verification gateway.
///
/// The gateway's failure reason is not interpreted by the flow; it is
/// carried only for logging and operator diagnostics.
#[derive(Debug, Clone, Error)]
#[error("verification gateway failure: {0}")]
pub struct GatewayError(pub String);

/// Opaque failure from the binding ledger.
#[derive(Debug, Clone, Error)]
#[error("binding ledger failure: {0}")]
pub struct LedgerError(pub String);

/// Flow-level errors.
///
/// Local validation failures and code rejections are NOT errors: they
/// are converted into session state (the invalid-input flag) so the
/// presentation layer can re-render and let the user retry. Only
/// misuse of the machine and collaborator transport failures surface
/// here.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("another call is already in flight for this session")]
    CallInFlight,

    #[error("operation not allowed in step {0}")]
    WrongStep(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("call exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}
