//! Error types for the chain ledger client.

use thiserror::Error;

/// Chain ledger client errors.
#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("no wallet bound to {0}")]
    NumberNotBound(String),
}

impl From<alloy::providers::PendingTransactionError> for LedgerClientError {
    fn from(e: alloy::providers::PendingTransactionError) -> Self {
        LedgerClientError::Transaction(e.to_string())
    }
}
