//! Rate limiting for the HTTP API.
//!
//! Two budgets apply: a global cap across the whole API, and a tighter
//! per-session cap on the verification endpoints. Every submit on a
//! session fans out to the SMS gateway or the chain, so a single
//! session must not be able to burn the service's Twilio quota or gas.

use crate::error::ServiceError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{keyed::DefaultKeyedStateStore, InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;
use uuid::Uuid;

type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type SessionLimiter = RateLimiter<Uuid, DefaultKeyedStateStore<Uuid>, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    global: Arc<GlobalLimiter>,
    per_session: Arc<SessionLimiter>,
}

impl RateLimitState {
    pub fn new(global_per_minute: u32, session_per_minute: u32) -> Self {
        Self {
            global: Arc::new(RateLimiter::direct(per_minute(global_per_minute))),
            per_session: Arc::new(RateLimiter::keyed(per_minute(session_per_minute))),
        }
    }

    /// Budgets high enough that tests never trip them.
    pub fn permissive() -> Self {
        Self::new(1000, 1000)
    }
}

fn per_minute(requests: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN))
}

/// Reject requests over either budget with 429 Too Many Requests.
pub async fn rate_limit_middleware(
    State(limits): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if limits.global.check().is_err() {
        warn!("Global rate limit exceeded");
        return Err(ServiceError::RateLimitExceeded);
    }

    if let Some(session) = session_key(request.uri().path()) {
        if limits.per_session.check_key(&session).is_err() {
            warn!(%session, "Session rate limit exceeded");
            return Err(ServiceError::RateLimitExceeded);
        }
    }

    Ok(next.run(request).await)
}

/// The session id for requests that count against the per-session
/// budget. Malformed ids fall through to the handler, which rejects
/// them without spending a gateway or chain call.
fn session_key(path: &str) -> Option<Uuid> {
    let rest = path.strip_prefix("/v1/verification/sessions/")?;
    let id = rest.split('/').next()?;
    Uuid::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_for_session_paths() {
        let id = Uuid::new_v4();

        let bare = format!("/v1/verification/sessions/{}", id);
        assert_eq!(session_key(&bare), Some(id));

        let submit = format!("/v1/verification/sessions/{}/number", id);
        assert_eq!(session_key(&submit), Some(id));
    }

    #[test]
    fn test_session_key_ignores_other_paths() {
        assert_eq!(session_key("/v1/verification/sessions"), None);
        assert_eq!(session_key("/v1/cards/mint"), None);
        assert_eq!(session_key("/v1/verification/sessions/not-a-uuid"), None);
    }

    #[test]
    fn test_session_budgets_are_independent() {
        let limits = RateLimitState::new(1000, 1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(limits.per_session.check_key(&a).is_ok());
        assert!(limits.per_session.check_key(&a).is_err());
        assert!(limits.per_session.check_key(&b).is_ok());
    }

    #[test]
    fn test_global_budget_exhaustion() {
        let limits = RateLimitState::new(1, 1000);

        assert!(limits.global.check().is_ok());
        assert!(limits.global.check().is_err());
    }

    #[test]
    fn test_zero_budget_is_clamped() {
        let limits = RateLimitState::new(0, 0);
        assert!(limits.global.check().is_ok());
    }
}
