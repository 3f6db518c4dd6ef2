//! Redeem codes and the local record of codes already used

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// An opaque token entitling the wallet to a top-up once validated server-side.
///
/// The only client-side rule is that it is not blank; surrounding whitespace
/// is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RedeemCode(String);

impl RedeemCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RedeemCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A code that was accepted by the server
///
/// Lists written by older clients hold bare code strings; those load with
/// no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRecord")]
pub struct RedemptionRecord {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Full {
        code: String,
        #[serde(default)]
        redeemed_at: Option<DateTime<Utc>>,
    },
}

impl From<StoredRecord> for RedemptionRecord {
    fn from(stored: StoredRecord) -> Self {
        match stored {
            StoredRecord::Bare(code) => Self {
                code,
                redeemed_at: None,
            },
            StoredRecord::Full { code, redeemed_at } => Self { code, redeemed_at },
        }
    }
}

/// Ordered set of used codes, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedCodes(Vec<RedemptionRecord>);

impl UsedCodes {
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|r| r.code == code)
    }

    /// Append `code` unless it is already present. Returns true when added.
    pub fn insert(&mut self, code: &RedeemCode, at: DateTime<Utc>) -> bool {
        if self.contains(code.as_str()) {
            return false;
        }
        self.0.push(RedemptionRecord {
            code: code.as_str().to_string(),
            redeemed_at: Some(at),
        });
        true
    }

    pub fn records(&self) -> &[RedemptionRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
