//! HTTP request handlers.

use super::types::{
    BindingResponse, CreateSessionRequest, HealthResponse, MintCardRequest, NamesResponse,
    PreviewCardRequest, SessionResponse, SubmitCodeRequest, SubmitNumberRequest, TransferRequest,
    TxResponse,
};
use super::AppState;
use crate::error::ServiceError;
use crate::sessions::Flow;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use card_renderer::{render, CardSpec};
use chain_ledger::U256;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use verification_flow::{AccountId, PhoneNumber};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: state.sessions.count().await,
    })
}

/// Open a verification session for a wallet.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let account = parse_account(&request.account)?;
    info!(account = %account, "Opening verification session");

    let (id, view) = state.sessions.create(account).await;
    Ok(Json(SessionResponse::new(id, view)))
}

/// Current state of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let flow = lookup_session(&state, &id).await?;
    Ok(Json(SessionResponse::new(id, flow.view().await)))
}

/// Submit the phone number for a session.
pub async fn submit_number(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitNumberRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let flow = lookup_session(&state, &id).await?;
    let view = flow.submit_number(&request.number).await?;
    Ok(Json(SessionResponse::new(id, view)))
}

/// Submit the one-time code for a session.
pub async fn submit_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitCodeRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let flow = lookup_session(&state, &id).await?;
    let view = flow.submit_code(&request.code).await?;
    Ok(Json(SessionResponse::new(id, view)))
}

/// Retry the binding write after a failure.
pub async fn retry_binding(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let flow = lookup_session(&state, &id).await?;
    let view = flow.retry_binding().await?;
    Ok(Json(SessionResponse::new(id, view)))
}

/// Cancel a session and discard its state.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let flow = state
        .sessions
        .remove(&id)
        .await
        .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))?;
    let view = flow.cancel().await;
    info!(session = %id, "Verification session cancelled");
    Ok(Json(SessionResponse::new(id, view)))
}

/// Look up the wallet bound to a phone number.
pub async fn get_binding(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<BindingResponse>, ServiceError> {
    let number = parse_number(&number)?;
    let address = state.cards.address_for_number(number.as_e164()).await?;
    Ok(Json(BindingResponse {
        number: number.as_e164().to_string(),
        address,
    }))
}

/// Remove the binding for a phone number.
pub async fn unbind_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<TxResponse>, ServiceError> {
    let number = parse_number(&number)?;
    info!(number = %number, "Unbinding number");

    let tx_hash = state.cards.unbind_number(number.as_e164()).await?;
    Ok(Json(TxResponse { tx_hash }))
}

/// Render a card preview. The preview is byte-identical to the image
/// minted for the same inputs.
pub async fn preview_card(
    Json(request): Json<PreviewCardRequest>,
) -> Result<Response, ServiceError> {
    let spec = CardSpec {
        amount: parse_amount(&request.amount)?,
        message: request.message,
        sender_name: request.sender_name,
        sender_address: request.sender_address,
    };
    let svg = render(&spec, request.template);

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// Mint a card NFT carrying the given value.
pub async fn mint_card(
    State(state): State<AppState>,
    Json(request): Json<MintCardRequest>,
) -> Result<Json<TxResponse>, ServiceError> {
    let amount = parse_amount(&request.amount)?;
    let spec = CardSpec {
        amount,
        message: request.message,
        sender_name: request.sender_name,
        sender_address: request.sender_address,
    };
    let svg = render(&spec, request.template);
    let token_uri = format!("data:image/svg+xml,{}", urlencoding::encode(&svg));

    info!(recipient = %request.recipient, "Minting card");
    let tx_hash = state
        .cards
        .mint_card(&request.recipient, &token_uri, U256::from(amount))
        .await?;
    Ok(Json(TxResponse { tx_hash }))
}

/// Send funds to the wallet bound to a phone number.
pub async fn transfer_to_phone(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TxResponse>, ServiceError> {
    let number = parse_number(&request.number)?;
    let amount = parse_amount(&request.amount)?;

    info!(number = %number, "Transfer to bound wallet requested");
    let tx_hash = state
        .cards
        .send_to_number(number.as_e164(), U256::from(amount))
        .await?;
    Ok(Json(TxResponse { tx_hash }))
}

/// Resolve identity names for a wallet address.
pub async fn resolve_names(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<NamesResponse>, ServiceError> {
    let names = state.resolver.resolve(&address).await?;
    Ok(Json(NamesResponse {
        address,
        total: names.len(),
        names,
    }))
}

async fn lookup_session(state: &AppState, id: &Uuid) -> Result<Arc<Flow>, ServiceError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))
}

fn parse_account(account: &str) -> Result<AccountId, ServiceError> {
    let hex = account
        .strip_prefix("0x")
        .ok_or_else(|| ServiceError::InvalidRequest("account must be a 0x address".into()))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ServiceError::InvalidRequest(
            "account must be a 20-byte hex address".into(),
        ));
    }
    Ok(AccountId::new(account))
}

fn parse_number(number: &str) -> Result<PhoneNumber, ServiceError> {
    PhoneNumber::parse(number).map_err(ServiceError::from)
}

fn parse_amount(amount: &str) -> Result<u128, ServiceError> {
    amount
        .parse::<u128>()
        .map_err(|_| ServiceError::InvalidRequest("amount must be a decimal wei value".into()))
}
