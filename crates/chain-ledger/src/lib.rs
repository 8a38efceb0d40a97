//! Gift card contract client.
//!
//! Narrow calls against the on-chain gift card contract: bind/unbind a
//! phone number to a wallet, look a number up, mint a card NFT, and
//! send funds to a bound number. The contract's ABI and the wallet
//! provider are opaque dependencies; nothing here re-specifies them.

mod client;
mod error;

pub use client::{number_hash, GiftCardClient, GiftCardOps};
pub use error::LedgerClientError;

pub use alloy::primitives::U256;
