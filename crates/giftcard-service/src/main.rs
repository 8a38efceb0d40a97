//! Gift Card NFT service - Entry point.

use chain_ledger::{GiftCardClient, GiftCardOps};
use giftcard_service::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
    names::NameResolver,
    sessions::SessionManager,
};
use sms_gateway::TwilioVerifyClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verification_flow::{BindingLedger, VerificationGateway};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gift Card NFT service");

    // SMS verification gateway
    let gateway = match TwilioVerifyClient::new(
        &config.twilio.base_url,
        &config.twilio.account_sid,
        &config.twilio.service_sid,
        config.twilio.auth_token.clone(),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create verification gateway client: {}", e);
            std::process::exit(1);
        }
    };

    // Gift card contract client
    let chain = match GiftCardClient::new(
        &config.chain.rpc_url,
        &config.chain.contract_address,
        &config.chain.private_key,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create chain client: {}", e);
            std::process::exit(1);
        }
    };

    // Identity name resolver
    let resolver = match NameResolver::new(&config.resolver.base_url) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create name resolver: {}", e);
            std::process::exit(1);
        }
    };

    let gateway: Arc<dyn VerificationGateway> = Arc::new(gateway);
    let ledger: Arc<dyn BindingLedger> = Arc::new(chain.clone());
    let cards: Arc<dyn GiftCardOps> = Arc::new(chain);

    let sessions = SessionManager::new(gateway, ledger, config.verification.call_deadline);
    let state = AppState::new(sessions, cards, resolver);

    // Sweep abandoned verification sessions in the background
    let sweep_sessions = state.sessions.clone();
    let session_ttl = config.verification.session_ttl;
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweep_sessions.evict_expired(session_ttl).await;
        }
    });

    // Create router with rate limiting from config
    let rate_limit = RateLimitState::new(
        config.rate_limit.global_per_minute,
        config.rate_limit.session_per_minute,
    );
    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
