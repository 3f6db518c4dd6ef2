//! Core domain entities
//!
//! Plain data and validation rules for the top-up flow. No I/O here.

pub mod balance;
pub mod flow;
mod media;
mod redemption;
pub mod result;
mod user;

pub use balance::WalletBalance;
pub use flow::{CaptureMethod, FlowState, Notice, NoticeKind, SubmitOutcome};
pub use media::Frame;
pub use redemption::{RedeemCode, RedemptionRecord, UsedCodes};
pub use user::Profile;
