//! Wallet backend port
//!
//! The remote API answers every call with a JSON envelope carrying an
//! application-level `errorCode`; `0` means success. HTTP status codes are
//! not part of the contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::result::Result;

/// Response envelope shared by all wallet endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    // Missing is None; `#[serde(default)]` would add a `T: Default` bound
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            error_code: 0,
            error_message: None,
            data,
        }
    }

    pub fn rejected(error_code: i64, message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

/// `data` of the user info endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Remote wallet endpoints
///
/// Implementations return `Error::Transport` for anything that prevents
/// reading an envelope (connection, timeout, malformed body). Domain
/// rejections come back as `Ok` envelopes with a non-zero `error_code`.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Redeem a top-up code
    async fn redeem(&self, code: &str) -> Result<ApiEnvelope<JsonValue>>;

    /// Current wallet balance; `data` is a number or numeric string
    async fn get_balance(&self) -> Result<ApiEnvelope<JsonValue>>;

    /// Profile of the signed-in user
    async fn get_user_info(&self) -> Result<ApiEnvelope<UserInfo>>;
}

#[cfg(test)]
mod tests {
    use serde::de::DeserializeOwned;

    use super::*;

    /// Deserializes the way the HTTP adapter does, with only `DeserializeOwned`
    fn parse<T: DeserializeOwned>(body: &str) -> ApiEnvelope<T> {
        serde_json::from_str(body).unwrap()
    }

    /// A payload type with no `Default`
    #[derive(Debug, Deserialize, PartialEq)]
    struct Amount(u32);

    #[test]
    fn test_generic_envelope_without_data() {
        let env: ApiEnvelope<Amount> = parse(r#"{"errorCode":3,"errorMessage":"busy"}"#);
        assert_eq!(env.error_code, 3);
        assert!(env.data.is_none());

        let env: ApiEnvelope<Amount> = parse(r#"{"errorCode":0,"data":7}"#);
        assert_eq!(env.data, Some(Amount(7)));
    }

    #[test]
    fn test_envelope_without_optional_fields() {
        let env: ApiEnvelope<JsonValue> = serde_json::from_str(r#"{"errorCode":0}"#).unwrap();
        assert!(env.is_success());
        assert!(env.data.is_none());
        assert!(env.error_message.is_none());
    }

    #[test]
    fn test_rejection_envelope() {
        let env: ApiEnvelope<JsonValue> =
            serde_json::from_str(r#"{"errorCode":5,"errorMessage":"كود غير صالح","data":null}"#)
                .unwrap();
        assert!(!env.is_success());
        assert_eq!(env.error_message.as_deref(), Some("كود غير صالح"));
    }

    #[test]
    fn test_user_info_envelope() {
        let env: ApiEnvelope<UserInfo> = serde_json::from_str(
            r#"{"errorCode":0,"data":{"phoneNumber":"01012345678","extra":true}}"#,
        )
        .unwrap();
        assert_eq!(
            env.data.unwrap().phone_number.as_deref(),
            Some("01012345678")
        );
    }
}
