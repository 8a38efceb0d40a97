//! Twilio Verify REST client.

use crate::error::SmsGatewayError;
use crate::types::VerificationResource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use verification_flow::{GatewayError, PhoneNumber, VerificationGateway};

/// Client for a Twilio Verify-style verification service.
#[derive(Clone)]
pub struct TwilioVerifyClient {
    client: Client,
    base_url: String,
    account_sid: String,
    service_sid: String,
    auth_token: SecretString,
}

impl TwilioVerifyClient {
    /// Create a new client for the given Verify service.
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        service_sid: impl Into<String>,
        auth_token: SecretString,
    ) -> Result<Self, SmsGatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            service_sid: service_sid.into(),
            auth_token,
        })
    }

    /// Start a verification: the service sends a one-time code to the
    /// number via SMS.
    #[instrument(skip(self))]
    pub async fn start_verification(&self, number: &str) -> Result<(), SmsGatewayError> {
        let url = format!(
            "{}/v2/Services/{}/Verifications",
            self.base_url, self.service_sid
        );

        debug!(url = %url, "Starting verification");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", number), ("Channel", "sms")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Verification start failed");
            return Err(SmsGatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(number = %number, "Verification started");
        Ok(())
    }

    /// Check a user-entered code against the current verification for
    /// the number. Returns false for a wrong code; an expired or
    /// already-consumed verification (404 from the service) also maps
    /// to false, since both mean "not currently valid".
    #[instrument(skip(self, code))]
    pub async fn check_verification(
        &self,
        number: &str,
        code: &str,
    ) -> Result<bool, SmsGatewayError> {
        let url = format!(
            "{}/v2/Services/{}/VerificationCheck",
            self.base_url, self.service_sid
        );

        debug!(url = %url, "Checking verification code");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", number), ("Code", code)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(number = %number, "No active verification for number");
            return Ok(false);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Verification check failed");
            return Err(SmsGatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let resource: VerificationResource = response
            .json()
            .await
            .map_err(|e| SmsGatewayError::InvalidResponse(e.to_string()))?;

        debug!(number = %number, status = %resource.status, "Verification check result");
        Ok(resource.is_approved())
    }
}

#[async_trait]
impl VerificationGateway for TwilioVerifyClient {
    async fn send_code(&self, number: &PhoneNumber) -> Result<(), GatewayError> {
        self.start_verification(number.as_e164())
            .await
            .map_err(|e| GatewayError(e.to_string()))
    }

    async fn check_code(&self, number: &PhoneNumber, code: &str) -> Result<bool, GatewayError> {
        self.check_verification(number.as_e164(), code)
            .await
            .map_err(|e| GatewayError(e.to_string()))
    }
}
