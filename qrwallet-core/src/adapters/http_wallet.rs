//! Wallet API client
//!
//! Talks JSON over HTTPS to the portal backend. Every endpoint answers with
//! an `{ errorCode, errorMessage?, data? }` envelope.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::ports::{ApiEnvelope, UserInfo, WalletBackend};

/// Default production API URL
pub const DEFAULT_BASE_URL: &str = "https://eng-mohamedkhalf.shop/api";

/// Default timeout for each request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable to override the API base URL
pub const API_URL_ENV: &str = "QRWALLET_API_URL";

/// HTTP implementation of the wallet backend port
#[derive(Debug, Clone)]
pub struct HttpWalletBackend {
    client: Client,
    base_url: Url,
    token: String,
    lang: String,
    timeout: Duration,
}

impl HttpWalletBackend {
    /// Create a client for `base_url`, authenticating with `token`
    pub fn new(base_url: &str, token: &str, lang: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).context("Invalid API base URL")?;

        if !matches!(parsed.scheme(), "https" | "http") {
            anyhow::bail!("API base URL must use HTTP or HTTPS, got '{}'", parsed.scheme());
        }
        if parsed.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot be used as a base: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed,
            token: token.to_string(),
            lang: lang.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> DomainResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::Config("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("lang", &self.lang)
            .header(ACCEPT, "application/json");
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<ApiEnvelope<T>> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;

        serde_json::from_str(&body).map_err(|e| {
            DomainError::Transport(format!(
                "Unexpected response from wallet API (HTTP {}): {}",
                status.as_u16(),
                e
            ))
        })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> DomainError {
        if error.is_timeout() {
            DomainError::Transport(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            DomainError::Transport("Unable to connect to the wallet API".to_string())
        } else {
            DomainError::Transport(format!("Wallet API request failed: {}", error))
        }
    }
}

#[async_trait]
impl WalletBackend for HttpWalletBackend {
    async fn redeem(&self, code: &str) -> DomainResult<ApiEnvelope<JsonValue>> {
        let url = self.endpoint(&["QRs", "ReadQr", code])?;
        self.send(self.client.post(url).body("")).await
    }

    async fn get_balance(&self) -> DomainResult<ApiEnvelope<JsonValue>> {
        let url = self.endpoint(&["Wallet", "GetWalletBalance"])?;
        self.send(self.client.get(url)).await
    }

    async fn get_user_info(&self) -> DomainResult<ApiEnvelope<UserInfo>> {
        let url = self.endpoint(&["Users", "GetUserInfo"])?;
        self.send(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpWalletBackend {
        HttpWalletBackend::new(base, "tok", "ar", DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = backend("https://example.com/api").endpoint(&["Wallet", "GetWalletBalance"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/Wallet/GetWalletBalance");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let url = backend("https://example.com/api/").endpoint(&["QRs", "ReadQr", "X"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/QRs/ReadQr/X");
    }

    #[test]
    fn test_code_is_percent_encoded() {
        let url = backend(DEFAULT_BASE_URL).endpoint(&["QRs", "ReadQr", "A/B C?"]).unwrap();
        assert!(url.as_str().ends_with("/QRs/ReadQr/A%2FB%20C%3F"));
    }

    #[test]
    fn test_reject_non_http_url() {
        let result = HttpWalletBackend::new("ftp://example.com", "t", "ar", DEFAULT_TIMEOUT);
        assert!(result.unwrap_err().to_string().contains("HTTP"));
    }

    #[test]
    fn test_reject_invalid_url() {
        assert!(HttpWalletBackend::new("not a url", "t", "ar", DEFAULT_TIMEOUT).is_err());
    }
}
