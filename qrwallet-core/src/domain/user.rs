//! Signed-in student profile

use serde::{Deserialize, Serialize};

/// Profile fields kept in the local session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_name: String,
    pub phone_number: String,
    /// Bearer token for the wallet API
    #[serde(skip_serializing)]
    pub token: String,
}

impl Profile {
    pub fn new(
        user_name: impl Into<String>,
        phone_number: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            phone_number: phone_number.into(),
            token: token.into(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        !self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_creation() {
        let profile = Profile::new("Mona", "01000000000", "tok");
        assert_eq!(profile.user_name, "Mona");
        assert!(profile.is_signed_in());
        assert!(!Profile::default().is_signed_in());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let json = serde_json::to_value(Profile::new("a", "b", "secret")).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["phoneNumber"], "b");
    }
}
