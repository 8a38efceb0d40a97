//! HTTP API for the gift card service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::names::NameResolver;
use crate::sessions::SessionManager;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chain_ledger::GiftCardOps;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Open verification sessions
    pub sessions: Arc<SessionManager>,
    /// Gift card contract client
    pub cards: Arc<dyn GiftCardOps>,
    /// Identity name resolver
    pub resolver: Arc<NameResolver>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        sessions: SessionManager,
        cards: Arc<dyn GiftCardOps>,
        resolver: NameResolver,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            cards,
            resolver: Arc::new(resolver),
        }
    }
}

/// Create the API router with default rate limits.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60, 10))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        // Phone verification sessions
        .route("/v1/verification/sessions", post(handlers::create_session))
        .route(
            "/v1/verification/sessions/:id",
            get(handlers::get_session).delete(handlers::cancel_session),
        )
        .route(
            "/v1/verification/sessions/:id/number",
            post(handlers::submit_number),
        )
        .route(
            "/v1/verification/sessions/:id/code",
            post(handlers::submit_code),
        )
        .route(
            "/v1/verification/sessions/:id/retry",
            post(handlers::retry_binding),
        )
        // Phone number bindings
        .route(
            "/v1/bindings/:number",
            get(handlers::get_binding).delete(handlers::unbind_number),
        )
        // Cards
        .route("/v1/cards/preview", post(handlers::preview_card))
        .route("/v1/cards/mint", post(handlers::mint_card))
        // Transfers
        .route("/v1/transfers/phone", post(handlers::transfer_to_phone))
        // Name resolution
        .route("/v1/names/:address", get(handlers::resolve_names))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
