//! Identity name resolution via the third-party middleware.
//!
//! A single narrow call: given a wallet address, fetch the
//! human-readable "soul names" registered for it. The middleware's
//! internals are opaque; failures are surfaced as-is.

use crate::error::ServiceError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for the identity middleware.
#[derive(Clone)]
pub struct NameResolver {
    client: Client,
    base_url: String,
}

impl NameResolver {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// All names registered for the address; empty when there are none.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/soul-names/{}", self.base_url, address);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Resolver(format!("{}: {}", status, body)));
        }

        let names: Vec<String> = response
            .json()
            .await
            .map_err(|e| ServiceError::Resolver(format!("invalid response: {}", e)))?;

        debug!(address = %address, count = names.len(), "Resolved names");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_resolve_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/soul-names/0x00000000000000000000000000000000000000aa"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!(["alice.soul", "al.soul"])),
            )
            .mount(&server)
            .await;

        let resolver = NameResolver::new(server.uri()).unwrap();
        let names = resolver
            .resolve("0x00000000000000000000000000000000000000aa")
            .await
            .unwrap();
        assert_eq!(names, vec!["alice.soul".to_string(), "al.soul".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_no_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let resolver = NameResolver::new(server.uri()).unwrap();
        let names = resolver.resolve("0xbb").await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_error_is_opaque() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let resolver = NameResolver::new(server.uri()).unwrap();
        let err = resolver.resolve("0xbb").await.unwrap_err();
        assert!(matches!(err, ServiceError::Resolver(_)));
    }
}
