//! Gift Card NFT service.
//!
//! HTTP front for the gift card application: phone verification
//! sessions (verify a number via SMS, then bind it to a wallet
//! on-chain), card preview and minting, sending funds to a phone
//! number, and identity name resolution.

pub mod api;
pub mod config;
pub mod error;
pub mod names;
pub mod sessions;

pub use config::Config;
pub use error::ServiceError;
pub use sessions::SessionManager;
