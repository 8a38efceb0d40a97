//! Collaborator traits for the verification flow.

use crate::error::{GatewayError, LedgerError};
use crate::phone::PhoneNumber;
use async_trait::async_trait;
use std::fmt;

/// The account identity a verified number is bound to.
///
/// Passed explicitly into the flow at session creation; the flow never
/// reaches into ambient global state for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SMS verification gateway.
///
/// Sends a one-time code to a phone number and later confirms a
/// (number, code) pair. The server-side code record is never visible
/// to this component.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    /// Trigger out-of-band delivery of a one-time code to the number.
    async fn send_code(&self, number: &PhoneNumber) -> Result<(), GatewayError>;

    /// Confirm a user-entered code. `Ok(false)` covers both a wrong
    /// and an expired code; the distinction is not surfaced.
    async fn check_code(&self, number: &PhoneNumber, code: &str) -> Result<bool, GatewayError>;
}

/// Durable binding of a verified phone number to an account identity.
#[async_trait]
pub trait BindingLedger: Send + Sync {
    /// Associate `number` with `account`. A single atomic external
    /// write that either succeeds or fails.
    async fn bind_number(&self, account: &AccountId, number: &PhoneNumber)
        -> Result<(), LedgerError>;
}
