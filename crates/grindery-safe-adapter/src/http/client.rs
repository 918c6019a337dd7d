/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client with a cookie jar, ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::http::{AuthError, Result};

/// Base URL of the Grindery engine (authorization server)
pub const ENGINE_URL: &str = "https://orchestrator.grindery.org";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the Grindery engine OAuth endpoints
///
/// Cheap to clone; clones share the connection pool and the cookie jar, so a
/// session cookie set by one call is sent by the next.
#[derive(Debug, Clone)]
pub struct SessionApiClient {
    http_client: Client,
    base_url: Url,
}

impl SessionApiClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, ENGINE_URL)
    }

    /// Create a new client against an explicit engine URL
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Engine URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint relative to the base path
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build request builder for an endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and fail on non-success status
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AuthError::server_error(status, body))
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidResponse(format!("Undecodable response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let client = SessionApiClient::new().unwrap();
        assert_eq!(client.base_url().as_str(), "https://orchestrator.grindery.org/");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = SessionApiClient::with_config_and_base_url(ClientConfig::default(), "not a url")
            .unwrap_err();
        assert!(matches!(err, AuthError::UrlParse(_)));
    }

    #[test]
    fn test_endpoint_join() {
        let client = SessionApiClient::with_config_and_base_url(
            ClientConfig::default(),
            "http://127.0.0.1:9000",
        )
        .unwrap();
        assert_eq!(
            client.url("oauth/token").unwrap().as_str(),
            "http://127.0.0.1:9000/oauth/token"
        );
    }

    #[test]
    fn test_endpoint_join_keeps_base_path() {
        for base in ["http://127.0.0.1:9000/engine", "http://127.0.0.1:9000/engine/"] {
            let client =
                SessionApiClient::with_config_and_base_url(ClientConfig::default(), base).unwrap();
            assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9000/engine/");
            assert_eq!(
                client.url("oauth/token").unwrap().as_str(),
                "http://127.0.0.1:9000/engine/oauth/token"
            );
        }
    }
}
