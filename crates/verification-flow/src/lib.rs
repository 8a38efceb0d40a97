//! Phone number verification and binding flow.
//!
//! Models one run of the "verify your phone number" flow as an explicit
//! state machine: the user submits a number, receives a one-time code
//! out of band, submits the code, and on confirmation the number is
//! bound to their wallet on-chain. The two external collaborators (the
//! SMS verification gateway and the binding ledger) are abstracted
//! behind traits so the machine itself stays free of I/O concerns.

mod error;
mod flow;
mod gateway;
mod phone;
mod session;

pub use error::{FlowError, GatewayError, LedgerError};
pub use flow::VerificationFlow;
pub use gateway::{AccountId, BindingLedger, VerificationGateway};
pub use phone::PhoneNumber;
pub use session::{SessionView, Step, VerificationSession};
