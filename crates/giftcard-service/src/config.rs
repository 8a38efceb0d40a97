//! Configuration for the gift card service.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// SMS verification gateway (Twilio Verify) configuration
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Chain / contract configuration
    #[serde(default)]
    pub chain: ChainConfig,

    /// Identity name resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Verification flow configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// Verify API base URL
    #[serde(default = "default_twilio_url")]
    pub base_url: String,

    /// Account SID
    #[serde(default)]
    pub account_sid: String,

    /// Verify service SID
    #[serde(default)]
    pub service_sid: String,

    /// Auth token
    #[serde(default = "default_secret")]
    pub auth_token: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Gift card contract address
    #[serde(default)]
    pub contract_address: String,

    /// Service signer key
    #[serde(default = "default_secret")]
    pub private_key: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Identity middleware base URL
    #[serde(default = "default_resolver_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Deadline for each gateway/ledger call within a session
    #[serde(with = "humantime_serde", default = "default_call_deadline")]
    pub call_deadline: Duration,

    /// Age at which an abandoned session is evicted
    #[serde(with = "humantime_serde", default = "default_session_ttl")]
    pub session_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,

    /// Requests per minute against a single verification session
    #[serde(default = "default_session_rpm")]
    pub session_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            base_url: default_twilio_url(),
            account_sid: String::new(),
            service_sid: String::new(),
            auth_token: default_secret(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: String::new(),
            private_key: default_secret(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: default_resolver_url(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            call_deadline: default_call_deadline(),
            session_ttl: default_session_ttl(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
            session_per_minute: default_session_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8082
}

fn default_twilio_url() -> String {
    "https://verify.twilio.com".into()
}

fn default_rpc_url() -> String {
    "http://localhost:8545".into()
}

fn default_resolver_url() -> String {
    "https://middleware.masa.finance".into()
}

fn default_call_deadline() -> Duration {
    Duration::from_secs(30)
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_global_rpm() -> u32 {
    60
}

fn default_session_rpm() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".into()
}

fn default_secret() -> SecretString {
    SecretString::new(String::new())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
