//! Top-up flow states, notices and outcomes

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::balance::WalletBalance;

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// States of the top-up dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Dialog closed
    Idle,
    ChoosingMethod,
    CameraActive,
    FilePicker,
    ManualEntry,
    Submitting,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::ChoosingMethod => "choosing_method",
            FlowState::CameraActive => "camera_active",
            FlowState::FilePicker => "file_picker",
            FlowState::ManualEntry => "manual_entry",
            FlowState::Submitting => "submitting",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a redeem code came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Camera,
    File,
    Manual,
}

impl CaptureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMethod::Camera => "camera",
            CaptureMethod::File => "file",
            CaptureMethod::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient, auto-dismissing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    shown_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, text)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= NOTICE_TTL
    }
}

/// Result of a successful redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Balance re-fetched and stored
    Confirmed { balance: WalletBalance },
    /// Code redeemed, but the follow-up balance fetch failed; balance untouched
    BalanceUnconfirmed { balance: WalletBalance },
}

impl SubmitOutcome {
    /// Balance held by the session after the operation
    pub fn balance(&self) -> WalletBalance {
        match self {
            SubmitOutcome::Confirmed { balance } | SubmitOutcome::BalanceUnconfirmed { balance } => {
                *balance
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmitOutcome::Confirmed { .. })
    }
}
