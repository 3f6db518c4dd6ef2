//! Result and error types for the core library

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flow::FlowState;

/// Core library error type
///
/// The first six variants are the top-up error taxonomy. Every one of them
/// ends the current attempt only; none is fatal to the application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Please enter a redeem code")]
    EmptyInput,

    #[error("Camera unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("QR code not recognized: {0}")]
    DecodeFailure(String),

    /// Server answered with a non-zero `errorCode`; `message` is shown verbatim
    #[error("{message}")]
    DomainRejected { code: i64, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Balance could not be confirmed: {0}")]
    BalanceUnconfirmed(String),

    #[error("Insufficient wallet balance: {balance} available, {price} required")]
    InsufficientFunds { balance: Decimal, price: Decimal },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: FlowState,
        action: &'static str,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether the user may simply try the same input again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::DecodeFailure(_)
                | Self::DomainRejected { .. }
                | Self::Transport(_)
        )
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}
