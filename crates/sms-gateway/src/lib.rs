//! SMS verification gateway backed by a Twilio Verify-style API.
//!
//! Thin request/response glue: start a verification (which delivers a
//! one-time code out of band) and check a user-entered code. The
//! gateway's internals are opaque to the rest of the system; it is
//! consumed through the `verification-flow` trait.

mod client;
mod error;
mod types;

pub use client::TwilioVerifyClient;
pub use error::SmsGatewayError;
