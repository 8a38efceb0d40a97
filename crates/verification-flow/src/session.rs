//! The verification session state machine.
//!
//! Pure, synchronous transitions. Network calls are modeled as
//! begin/complete pairs: `begin_*` marks the call in flight (enforcing
//! the single-flight invariant inside the machine itself) and
//! `complete_*` applies the outcome. The async orchestration lives in
//! [`crate::flow`].

use crate::error::FlowError;
use crate::gateway::AccountId;
use crate::phone::PhoneNumber;

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Initial step: the user is typing their phone number.
    EnteringNumber,
    /// A code was sent; the user is typing it in.
    EnteringCode,
    /// Code confirmed; the on-chain binding write is running.
    BindingInFlight,
    /// The binding write succeeded.
    BindingDone,
    /// The binding write failed; the user may retry it.
    BindingFailed,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::EnteringNumber => "entering_number",
            Step::EnteringCode => "entering_code",
            Step::BindingInFlight => "binding_in_flight",
            Step::BindingDone => "binding_done",
            Step::BindingFailed => "binding_failed",
        }
    }
}

/// Which external call is currently outstanding, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingCall {
    SendCode,
    CheckCode,
    Bind,
}

/// Snapshot of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub step: Step,
    pub invalid_input: bool,
    pub completed: bool,
}

/// One run of the verification flow, from opening to closing.
///
/// Transient and in-memory only; if the process restarts mid-flow the
/// session is lost and the user starts over.
#[derive(Debug)]
pub struct VerificationSession {
    account: AccountId,
    step: Step,
    number_input: String,
    code_input: String,
    /// Number accepted into the flow; set once the gateway send
    /// succeeds and immutable from then on.
    number: Option<PhoneNumber>,
    invalid_input: bool,
    completed: bool,
    in_flight: Option<PendingCall>,
}

impl VerificationSession {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            step: Step::EnteringNumber,
            number_input: String::new(),
            code_input: String::new(),
            number: None,
            invalid_input: false,
            completed: false,
            in_flight: None,
        }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn number_input(&self) -> &str {
        &self.number_input
    }

    pub fn code_input(&self) -> &str {
        &self.code_input
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            step: self.step,
            invalid_input: self.invalid_input,
            completed: self.completed,
        }
    }

    /// Replace the candidate number. Clears any invalid-input flag so
    /// the next submit re-validates fresh input.
    pub fn edit_number(&mut self, input: &str) {
        self.invalid_input = false;
        self.number_input = input.to_string();
    }

    /// Replace the candidate code. Also clears the invalid-input flag.
    pub fn edit_code(&mut self, input: &str) {
        self.invalid_input = false;
        self.code_input = input.to_string();
    }

    /// Validate the candidate number and mark the send-code call in
    /// flight. A malformed number is rejected here, synchronously; the
    /// gateway is never reached.
    pub fn begin_send_code(&mut self) -> Result<PhoneNumber, FlowError> {
        if self.step != Step::EnteringNumber {
            return Err(FlowError::WrongStep(self.step.as_str()));
        }
        self.ensure_idle()?;

        match PhoneNumber::parse(&self.number_input) {
            Ok(number) => {
                self.in_flight = Some(PendingCall::SendCode);
                Ok(number)
            }
            Err(e) => {
                self.invalid_input = true;
                Err(e)
            }
        }
    }

    /// The send-code call succeeded: accept the number into the flow
    /// and advance to code entry.
    pub fn complete_send_code(&mut self, number: PhoneNumber) {
        if self.in_flight != Some(PendingCall::SendCode) {
            // Stale completion after a cancel; drop it.
            return;
        }
        self.in_flight = None;
        self.number = Some(number);
        self.invalid_input = false;
        self.step = Step::EnteringCode;
    }

    /// Mark the check-code call in flight and hand back what the
    /// gateway needs.
    pub fn begin_check_code(&mut self) -> Result<(PhoneNumber, String), FlowError> {
        if self.step != Step::EnteringCode {
            return Err(FlowError::WrongStep(self.step.as_str()));
        }
        self.ensure_idle()?;

        // The number is always present in EnteringCode; it was stored
        // by complete_send_code.
        let number = self
            .number
            .clone()
            .ok_or(FlowError::WrongStep("entering_code"))?;
        self.in_flight = Some(PendingCall::CheckCode);
        Ok((number, self.code_input.clone()))
    }

    /// The gateway rejected the code (wrong or expired). The session
    /// stays in code entry for another attempt.
    pub fn complete_check_code_rejected(&mut self) {
        if self.in_flight != Some(PendingCall::CheckCode) {
            return;
        }
        self.in_flight = None;
        self.invalid_input = true;
    }

    /// The gateway confirmed the code. The session moves straight into
    /// the binding write; this is the only path that arms the ledger
    /// call, so a binding can never be issued for an unverified number.
    pub fn complete_check_code_confirmed(&mut self) -> Option<(AccountId, PhoneNumber)> {
        if self.in_flight != Some(PendingCall::CheckCode) {
            return None;
        }
        self.invalid_input = false;
        self.step = Step::BindingInFlight;
        self.in_flight = Some(PendingCall::Bind);
        let number = self.number.clone()?;
        Some((self.account.clone(), number))
    }

    /// Re-arm the binding write after a failure.
    pub fn begin_retry_bind(&mut self) -> Result<(AccountId, PhoneNumber), FlowError> {
        if self.step != Step::BindingFailed {
            return Err(FlowError::WrongStep(self.step.as_str()));
        }
        self.ensure_idle()?;

        let number = self
            .number
            .clone()
            .ok_or(FlowError::WrongStep("binding_failed"))?;
        self.step = Step::BindingInFlight;
        self.in_flight = Some(PendingCall::Bind);
        Ok((self.account.clone(), number))
    }

    /// The ledger write succeeded; the session is complete.
    pub fn complete_bind_ok(&mut self) {
        if self.in_flight != Some(PendingCall::Bind) {
            return;
        }
        self.in_flight = None;
        self.step = Step::BindingDone;
        self.completed = true;
    }

    /// The ledger write failed. The verified number is kept so the
    /// write can be retried without re-verifying.
    pub fn complete_bind_failed(&mut self) {
        if self.in_flight != Some(PendingCall::Bind) {
            return;
        }
        self.in_flight = None;
        self.step = Step::BindingFailed;
    }

    /// Abandon an outstanding call without applying an outcome, e.g.
    /// after a transport failure or timeout. For the binding write the
    /// failed state is entered instead so the retry path stays open.
    pub fn abort_call(&mut self) {
        if let Some(PendingCall::Bind) = self.in_flight.take() {
            self.step = Step::BindingFailed;
        }
    }

    /// Cancel/close: discard all session state. Any still-outstanding
    /// call completion will arrive with a cleared in-flight marker and
    /// be dropped.
    pub fn reset(&mut self) {
        self.step = Step::EnteringNumber;
        self.number_input.clear();
        self.code_input.clear();
        self.number = None;
        self.invalid_input = false;
        self.completed = false;
        self.in_flight = None;
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        if self.in_flight.is_some() {
            return Err(FlowError::CallInFlight);
        }
        Ok(())
    }
}
