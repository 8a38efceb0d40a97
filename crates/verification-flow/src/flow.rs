//! Async orchestration of one verification session.
//!
//! [`VerificationFlow`] owns a [`VerificationSession`] and drives its
//! external calls against the gateway and ledger. The session lock is
//! only held across the synchronous begin/complete transitions, never
//! across an await of a network call, so a concurrent submit observes
//! the in-flight marker and is rejected instead of blocking.

use crate::error::FlowError;
use crate::gateway::{AccountId, BindingLedger, VerificationGateway};
use crate::phone::PhoneNumber;
use crate::session::{SessionView, VerificationSession};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// One verification flow instance: the state machine plus its two
/// collaborators and the per-call deadline.
pub struct VerificationFlow<G: ?Sized, L: ?Sized> {
    session: Mutex<VerificationSession>,
    gateway: Arc<G>,
    ledger: Arc<L>,
    call_deadline: Duration,
}

impl<G, L> VerificationFlow<G, L>
where
    G: VerificationGateway + ?Sized,
    L: BindingLedger + ?Sized,
{
    pub fn new(
        account: AccountId,
        gateway: Arc<G>,
        ledger: Arc<L>,
        call_deadline: Duration,
    ) -> Self {
        Self {
            session: Mutex::new(VerificationSession::new(account)),
            gateway,
            ledger,
            call_deadline,
        }
    }

    /// Current session snapshot for the presentation layer.
    pub async fn view(&self) -> SessionView {
        self.session.lock().await.view()
    }

    /// Submit the phone number: validate locally, then ask the gateway
    /// to send a one-time code.
    ///
    /// A malformed number never reaches the gateway; it is reported
    /// through the invalid-input flag in the returned view. Transport
    /// failures leave the session in number entry and surface as `Err`.
    #[instrument(skip(self, input))]
    pub async fn submit_number(&self, input: &str) -> Result<SessionView, FlowError> {
        let number = {
            let mut session = self.session.lock().await;
            session.edit_number(input);
            match session.begin_send_code() {
                Ok(number) => number,
                Err(FlowError::InvalidPhoneNumber(reason)) => {
                    debug!(%reason, "phone number rejected locally");
                    return Ok(session.view());
                }
                Err(e) => return Err(e),
            }
        };

        let outcome = self.bounded(self.gateway.send_code(&number)).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(()) => {
                debug!(number = %number, "verification code sent");
                session.complete_send_code(number);
                Ok(session.view())
            }
            Err(e) => {
                warn!(error = %e, "sending verification code failed");
                session.abort_call();
                Err(e)
            }
        }
    }

    /// Submit the one-time code: confirm it with the gateway and, on
    /// success, immediately issue the binding write.
    ///
    /// A rejected code is reported through the invalid-input flag; the
    /// session stays in code entry for another attempt. A failed
    /// binding write lands in the failed state, from which
    /// [`retry_binding`](Self::retry_binding) can re-issue it.
    #[instrument(skip(self, input))]
    pub async fn submit_code(&self, input: &str) -> Result<SessionView, FlowError> {
        let (number, code) = {
            let mut session = self.session.lock().await;
            session.edit_code(input);
            session.begin_check_code()?
        };

        let confirmed = match self.bounded(self.gateway.check_code(&number, &code)).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!(error = %e, "code confirmation failed");
                self.session.lock().await.abort_call();
                return Err(e);
            }
        };

        let bind_target = {
            let mut session = self.session.lock().await;
            if !confirmed {
                debug!("gateway rejected verification code");
                session.complete_check_code_rejected();
                return Ok(session.view());
            }
            session.complete_check_code_confirmed()
        };

        match bind_target {
            Some((account, number)) => self.finish_binding(account, number).await,
            // Session was cancelled while the check was outstanding.
            None => Ok(self.view().await),
        }
    }

    /// Re-issue the binding write after a failure.
    #[instrument(skip(self))]
    pub async fn retry_binding(&self) -> Result<SessionView, FlowError> {
        let (account, number) = {
            let mut session = self.session.lock().await;
            session.begin_retry_bind()?
        };
        self.finish_binding(account, number).await
    }

    /// Cancel the flow and discard all session state.
    pub async fn cancel(&self) -> SessionView {
        let mut session = self.session.lock().await;
        session.reset();
        session.view()
    }

    async fn finish_binding(
        &self,
        account: AccountId,
        number: PhoneNumber,
    ) -> Result<SessionView, FlowError> {
        let outcome = self.bounded(self.ledger.bind_number(&account, &number)).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(()) => {
                debug!(account = %account, number = %number, "phone number bound");
                session.complete_bind_ok();
            }
            Err(e) => {
                // Recoverable: the failed state keeps the verified
                // number so the write can be retried as-is.
                warn!(error = %e, "binding write failed");
                session.complete_bind_failed();
            }
        }
        Ok(session.view())
    }

    async fn bounded<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, FlowError>
    where
        E: Into<FlowError>,
    {
        match tokio::time::timeout(self.call_deadline, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(FlowError::DeadlineExceeded(self.call_deadline)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, LedgerError};
    use crate::session::Step;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    const DEADLINE: Duration = Duration::from_secs(5);

    /// Scriptable gateway: counts calls and can hold a send-code call
    /// open until released, to exercise the single-flight guarantee.
    struct StubGateway {
        send_calls: AtomicUsize,
        check_calls: AtomicUsize,
        send_fails: AtomicBool,
        accept_code: AtomicBool,
        /// Signaled once a send-code call has started.
        started: Semaphore,
        /// Acquired before a send-code call is allowed to finish.
        release: Semaphore,
        hold_send: bool,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                send_calls: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
                send_fails: AtomicBool::new(false),
                accept_code: AtomicBool::new(true),
                started: Semaphore::new(0),
                release: Semaphore::new(0),
                hold_send: false,
            }
        }

        fn holding() -> Self {
            Self {
                hold_send: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl VerificationGateway for StubGateway {
        async fn send_code(&self, _number: &PhoneNumber) -> Result<(), GatewayError> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            if self.hold_send {
                self.started.add_permits(1);
                let permit = self.release.acquire().await.unwrap();
                permit.forget();
            }
            if self.send_fails.load(Ordering::SeqCst) {
                return Err(GatewayError("sms dispatch unavailable".into()));
            }
            Ok(())
        }

        async fn check_code(
            &self,
            _number: &PhoneNumber,
            _code: &str,
        ) -> Result<bool, GatewayError> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.accept_code.load(Ordering::SeqCst))
        }
    }

    struct StubLedger {
        bind_calls: AtomicUsize,
        /// Number of leading bind attempts that fail.
        fail_first: AtomicUsize,
        bound: Mutex<Vec<(String, String)>>,
    }

    impl StubLedger {
        fn new() -> Self {
            Self {
                bind_calls: AtomicUsize::new(0),
                fail_first: AtomicUsize::new(0),
                bound: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BindingLedger for StubLedger {
        async fn bind_number(
            &self,
            account: &AccountId,
            number: &PhoneNumber,
        ) -> Result<(), LedgerError> {
            self.bind_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(LedgerError("transaction reverted".into()));
            }
            self.bound
                .lock()
                .await
                .push((account.as_str().to_string(), number.as_e164().to_string()));
            Ok(())
        }
    }

    fn flow(
        gateway: &Arc<StubGateway>,
        ledger: &Arc<StubLedger>,
    ) -> VerificationFlow<StubGateway, StubLedger> {
        VerificationFlow::new(
            AccountId::new("0x00000000000000000000000000000000000000aa"),
            gateway.clone(),
            ledger.clone(),
            DEADLINE,
        )
    }

    #[tokio::test]
    async fn test_valid_number_reaches_gateway_once() {
        let gateway = Arc::new(StubGateway::new());
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        let view = flow.submit_number("+15551234567").await.unwrap();
        assert_eq!(view.step, Step::EnteringCode);
        assert!(!view.invalid_input);
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_number_never_reaches_gateway() {
        let gateway = Arc::new(StubGateway::new());
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        let view = flow.submit_number("12ab").await.unwrap();
        assert_eq!(view.step, Step::EnteringNumber);
        assert!(view.invalid_input);
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_code_sets_flag_and_stays() {
        let gateway = Arc::new(StubGateway::new());
        gateway.accept_code.store(false, Ordering::SeqCst);
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        flow.submit_number("+15551234567").await.unwrap();
        let view = flow.submit_code("000000").await.unwrap();

        assert_eq!(view.step, Step::EnteringCode);
        assert!(view.invalid_input);
        assert_eq!(ledger.bind_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepted_code_binds_exactly_once() {
        let gateway = Arc::new(StubGateway::new());
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        flow.submit_number("+15551234567").await.unwrap();
        let view = flow.submit_code("424242").await.unwrap();

        assert_eq!(view.step, Step::BindingDone);
        assert!(view.completed);
        assert_eq!(ledger.bind_calls.load(Ordering::SeqCst), 1);

        let bound = ledger.bound.lock().await;
        assert_eq!(
            bound.as_slice(),
            &[(
                "0x00000000000000000000000000000000000000aa".to_string(),
                "+15551234567".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_duplicate_submit_rejected_while_call_outstanding() {
        let gateway = Arc::new(StubGateway::holding());
        let ledger = Arc::new(StubLedger::new());
        let flow = Arc::new(flow(&gateway, &ledger));

        let first = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.submit_number("+15551234567").await })
        };

        // Wait until the first gateway call is genuinely in flight.
        let permit = gateway.started.acquire().await.unwrap();
        permit.forget();

        let err = flow.submit_number("+15551234567").await.unwrap_err();
        assert!(matches!(err, FlowError::CallInFlight));

        gateway.release.add_permits(1);
        let view = first.await.unwrap().unwrap();
        assert_eq!(view.step, Step::EnteringCode);
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gateway_send_failure_keeps_session_in_number_entry() {
        let gateway = Arc::new(StubGateway::new());
        gateway.send_fails.store(true, Ordering::SeqCst);
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        let err = flow.submit_number("+15551234567").await.unwrap_err();
        assert!(matches!(err, FlowError::Gateway(_)));

        let view = flow.view().await;
        assert_eq!(view.step, Step::EnteringNumber);

        // The session is still usable for another attempt.
        gateway.send_fails.store(false, Ordering::SeqCst);
        let view = flow.submit_number("+15551234567").await.unwrap();
        assert_eq!(view.step, Step::EnteringCode);
    }

    #[tokio::test]
    async fn test_binding_failure_enters_failed_state_then_retry_succeeds() {
        let gateway = Arc::new(StubGateway::new());
        let ledger = Arc::new(StubLedger::new());
        ledger.fail_first.store(1, Ordering::SeqCst);
        let flow = flow(&gateway, &ledger);

        flow.submit_number("+15551234567").await.unwrap();
        let view = flow.submit_code("424242").await.unwrap();
        assert_eq!(view.step, Step::BindingFailed);
        assert!(!view.completed);

        let view = flow.retry_binding().await.unwrap();
        assert_eq!(view.step, Step::BindingDone);
        assert!(view.completed);
        assert_eq!(ledger.bind_calls.load(Ordering::SeqCst), 2);
        // No second code confirmation was needed for the retry.
        assert_eq!(gateway.check_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_resets_to_fresh_session() {
        let gateway = Arc::new(StubGateway::new());
        let ledger = Arc::new(StubLedger::new());
        let flow = flow(&gateway, &ledger);

        flow.submit_number("+15551234567").await.unwrap();
        let view = flow.cancel().await;

        assert_eq!(view.step, Step::EnteringNumber);
        assert!(!view.invalid_input);
        assert!(!view.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_call_bounded_by_deadline() {
        struct NeverGateway;

        #[async_trait]
        impl VerificationGateway for NeverGateway {
            async fn send_code(&self, _number: &PhoneNumber) -> Result<(), GatewayError> {
                std::future::pending().await
            }

            async fn check_code(
                &self,
                _number: &PhoneNumber,
                _code: &str,
            ) -> Result<bool, GatewayError> {
                std::future::pending().await
            }
        }

        let ledger = Arc::new(StubLedger::new());
        let flow: VerificationFlow<NeverGateway, StubLedger> = VerificationFlow::new(
            AccountId::new("0x00000000000000000000000000000000000000aa"),
            Arc::new(NeverGateway),
            ledger,
            Duration::from_millis(50),
        );

        let err = flow.submit_number("+15551234567").await.unwrap_err();
        assert!(matches!(err, FlowError::DeadlineExceeded(_)));

        // Timed-out call released the in-flight marker.
        let view = flow.view().await;
        assert_eq!(view.step, Step::EnteringNumber);
    }
}
