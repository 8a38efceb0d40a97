//! In-memory verification session registry.
//!
//! Sessions are transient by design: they live only for one run of the
//! flow and are lost on restart. Each session is an independent
//! [`VerificationFlow`]; there is no shared mutable state between
//! them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;
use verification_flow::{
    AccountId, BindingLedger, SessionView, VerificationFlow, VerificationGateway,
};

/// A verification flow wired to the service's collaborators.
pub type Flow = VerificationFlow<dyn VerificationGateway, dyn BindingLedger>;

struct SessionEntry {
    flow: Arc<Flow>,
    opened_at: Instant,
}

/// Holds all open verification sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    gateway: Arc<dyn VerificationGateway>,
    ledger: Arc<dyn BindingLedger>,
    call_deadline: Duration,
}

impl SessionManager {
    pub fn new(
        gateway: Arc<dyn VerificationGateway>,
        ledger: Arc<dyn BindingLedger>,
        call_deadline: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            gateway,
            ledger,
            call_deadline,
        }
    }

    /// Open a new session for the given account identity.
    pub async fn create(&self, account: AccountId) -> (Uuid, SessionView) {
        let flow = Arc::new(VerificationFlow::new(
            account,
            self.gateway.clone(),
            self.ledger.clone(),
            self.call_deadline,
        ));
        let view = flow.view().await;

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            flow,
            opened_at: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        (id, view)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Flow>> {
        self.sessions.read().await.get(id).map(|e| e.flow.clone())
    }

    /// Close a session, discarding its state.
    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Flow>> {
        self.sessions.write().await.remove(id).map(|e| e.flow)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions older than `ttl`.
    ///
    /// Abandoned flows never delete themselves; without a periodic
    /// sweep the map only grows. Returns the number evicted.
    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.opened_at.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Expired verification sessions evicted");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use verification_flow::{GatewayError, LedgerError, PhoneNumber, Step};

    struct OkGateway;

    #[async_trait]
    impl VerificationGateway for OkGateway {
        async fn send_code(&self, _number: &PhoneNumber) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn check_code(
            &self,
            _number: &PhoneNumber,
            _code: &str,
        ) -> Result<bool, GatewayError> {
            Ok(true)
        }
    }

    struct OkLedger;

    #[async_trait]
    impl BindingLedger for OkLedger {
        async fn bind_number(
            &self,
            _account: &AccountId,
            _number: &PhoneNumber,
        ) -> Result<(), LedgerError> {
            Ok(())
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(OkGateway),
            Arc::new(OkLedger),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let manager = manager();
        let (id, view) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000aa"))
            .await;

        assert_eq!(view.step, Step::EnteringNumber);
        assert!(manager.get(&id).await.is_some());
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let manager = manager();
        let (a, _) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000aa"))
            .await;
        let (b, _) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000bb"))
            .await;

        let flow_a = manager.get(&a).await.unwrap();
        flow_a.submit_number("+15551234567").await.unwrap();

        let flow_b = manager.get(&b).await.unwrap();
        assert_eq!(flow_b.view().await.step, Step::EnteringNumber);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_drops_only_old_sessions() {
        let manager = manager();
        let (stale, _) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000aa"))
            .await;

        tokio::time::advance(Duration::from_secs(600)).await;
        let (fresh, _) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000bb"))
            .await;

        let evicted = manager.evict_expired(Duration::from_secs(300)).await;
        assert_eq!(evicted, 1);
        assert!(manager.get(&stale).await.is_none());
        assert!(manager.get(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_closes_session() {
        let manager = manager();
        let (id, _) = manager
            .create(AccountId::new("0x00000000000000000000000000000000000000aa"))
            .await;

        assert!(manager.remove(&id).await.is_some());
        assert!(manager.get(&id).await.is_none());
        assert_eq!(manager.count().await, 0);
    }
}
