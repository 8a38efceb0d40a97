//! API request and response types.

use card_renderer::CardTemplate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verification_flow::SessionView;

/// Request to open a verification session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Wallet address the verified number will be bound to
    pub account: String,
}

/// Verification session state as seen by the presentation layer.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub step: String,
    pub invalid_input: bool,
    pub completed: bool,
}

impl SessionResponse {
    pub fn new(session_id: Uuid, view: SessionView) -> Self {
        Self {
            session_id,
            step: view.step.as_str().to_string(),
            invalid_input: view.invalid_input,
            completed: view.completed,
        }
    }
}

/// Request to submit the phone number.
#[derive(Debug, Deserialize)]
pub struct SubmitNumberRequest {
    pub number: String,
}

/// Request to submit the one-time code.
#[derive(Debug, Deserialize)]
pub struct SubmitCodeRequest {
    pub code: String,
}

/// Request to render a card preview.
#[derive(Debug, Deserialize)]
pub struct PreviewCardRequest {
    /// Card value in wei, as a decimal string
    pub amount: String,

    pub message: String,

    pub sender_name: Option<String>,

    pub sender_address: String,

    #[serde(default)]
    pub template: CardTemplate,
}

/// Request to mint a card.
#[derive(Debug, Deserialize)]
pub struct MintCardRequest {
    /// Recipient wallet address
    pub recipient: String,

    /// Card value in wei, as a decimal string
    pub amount: String,

    pub message: String,

    pub sender_name: Option<String>,

    pub sender_address: String,

    #[serde(default)]
    pub template: CardTemplate,
}

/// Request to send funds to a phone number.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub number: String,

    /// Amount in wei, as a decimal string
    pub amount: String,
}

/// Response carrying a transaction hash.
#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx_hash: String,
}

/// Binding lookup response.
#[derive(Debug, Serialize)]
pub struct BindingResponse {
    pub number: String,
    pub address: Option<String>,
}

/// Name resolution response.
#[derive(Debug, Serialize)]
pub struct NamesResponse {
    pub address: String,
    pub names: Vec<String>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}
