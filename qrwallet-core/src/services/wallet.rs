//! Wallet service - calls to the remote wallet, bounded by a timeout
//!
//! Turns backend envelopes into domain results and keeps the session's
//! balance in step with what the server reports.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::result::{Error, Result};
use crate::domain::{Profile, RedeemCode, WalletBalance};
use crate::ports::WalletBackend;
use crate::services::UserSession;

/// Shown when the server rejects a code without saying why
pub const GENERIC_REJECTION: &str = "An error occurred while reading the QR code";

/// Run a backend call, failing with `Error::Transport` past `limit`
async fn bounded<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call).await.map_err(|_| {
        Error::transport(format!("No response from the wallet API after {}s", limit.as_secs()))
    })?
}

pub struct WalletService {
    backend: Arc<dyn WalletBackend>,
    session: Arc<UserSession>,
    request_timeout: Duration,
}

impl WalletService {
    pub fn new(
        backend: Arc<dyn WalletBackend>,
        session: Arc<UserSession>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            session,
            request_timeout,
        }
    }

    pub fn session(&self) -> &Arc<UserSession> {
        &self.session
    }

    /// Redeem `code` with the server
    ///
    /// A non-zero `errorCode` becomes `Error::DomainRejected` carrying the
    /// server's message.
    pub async fn redeem(&self, code: &RedeemCode) -> Result<()> {
        let envelope = bounded(self.request_timeout, self.backend.redeem(code.as_str())).await?;
        if envelope.is_success() {
            return Ok(());
        }

        let message = envelope
            .error_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION.to_string());
        Err(Error::DomainRejected {
            code: envelope.error_code,
            message,
        })
    }

    /// Fetch the balance and store it in the session
    ///
    /// Only a successful envelope with a readable, non-negative amount is
    /// trusted. Anything else returns `Error::BalanceUnconfirmed` and leaves
    /// the cached balance alone. Network failures stay `Error::Transport`.
    pub async fn refresh_balance(&self) -> Result<WalletBalance> {
        let envelope = bounded(self.request_timeout, self.backend.get_balance()).await?;

        if !envelope.is_success() {
            return Err(Error::BalanceUnconfirmed(
                envelope
                    .error_message
                    .unwrap_or_else(|| format!("error code {}", envelope.error_code)),
            ));
        }

        let balance = envelope
            .data
            .as_ref()
            .and_then(WalletBalance::from_api_value)
            .ok_or_else(|| Error::BalanceUnconfirmed("unreadable balance in response".to_string()))?;

        self.session.reconcile_balance(balance)?;
        Ok(balance)
    }

    /// Pull the phone number from the server into the session
    pub async fn refresh_profile(&self) -> Result<Profile> {
        let envelope = bounded(self.request_timeout, self.backend.get_user_info()).await?;

        if let Some(phone) = envelope
            .data
            .filter(|_| envelope.error_code == 0)
            .and_then(|info| info.phone_number)
            .filter(|p| !p.is_empty())
        {
            self.session.set_phone_number(&phone)?;
        }

        self.session.profile()
    }
}
