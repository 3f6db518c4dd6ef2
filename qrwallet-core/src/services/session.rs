//! Session service - signed-in profile and cached wallet balance
//!
//! The session is an explicit object handed to every component that needs
//! it. All reads go through the in-memory copy; every write goes through to
//! the local store so a restart sees the same state.

use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{Profile, WalletBalance};
use crate::ports::LocalStore;

pub const KEY_MONEY: &str = "money";
pub const KEY_USER_NAME: &str = "userName";
pub const KEY_PHONE_NUMBER: &str = "phoneNumber";
pub const KEY_TOKEN: &str = "token";

/// Keys cleared on logout. The used-code ledger is deliberately not here.
const LOGOUT_KEYS: &[&str] = &[
    KEY_USER_NAME,
    KEY_PHONE_NUMBER,
    KEY_TOKEN,
    KEY_MONEY,
    "subscribedGroups",
    "wallet_balance",
    "studentId",
    "studentDataComplete",
];

/// What a login hands over
#[derive(Debug, Clone, Default)]
pub struct LoginDetails {
    pub user_name: String,
    pub phone_number: String,
    pub token: String,
    /// Balance reported at login, if any
    pub balance: Option<WalletBalance>,
}

/// Session snapshot for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub signed_in: bool,
    #[serde(flatten)]
    pub profile: Profile,
    pub balance: WalletBalance,
}

#[derive(Debug, Default)]
struct SessionState {
    profile: Profile,
    balance: WalletBalance,
}

/// The signed-in student's session
pub struct UserSession {
    store: Arc<dyn LocalStore>,
    state: Mutex<SessionState>,
}

impl UserSession {
    /// Restore the session persisted in `store`
    pub fn load(store: Arc<dyn LocalStore>) -> Result<Self> {
        let read = |key: &str| -> Result<String> { Ok(store.get(key)?.unwrap_or_default()) };

        let profile = Profile::new(
            read(KEY_USER_NAME)?,
            read(KEY_PHONE_NUMBER)?,
            read(KEY_TOKEN)?,
        );
        let balance = WalletBalance::parse_cached(&read(KEY_MONEY)?);

        Ok(Self {
            store,
            state: Mutex::new(SessionState { profile, balance }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|e| Error::Other(format!("Session lock poisoned: {}", e)))
    }

    pub fn login(&self, details: LoginDetails) -> Result<()> {
        if details.token.trim().is_empty() {
            return Err(Error::validation("token must not be empty"));
        }
        let mut state = self.lock()?;

        self.store.set(KEY_USER_NAME, &details.user_name)?;
        self.store.set(KEY_PHONE_NUMBER, &details.phone_number)?;
        self.store.set(KEY_TOKEN, details.token.trim())?;
        state.profile = Profile::new(details.user_name, details.phone_number, details.token.trim());

        if let Some(balance) = details.balance {
            self.store.set(KEY_MONEY, &balance.to_string())?;
            state.balance = balance;
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        let mut state = self.lock()?;
        for key in LOGOUT_KEYS {
            self.store.remove(key)?;
        }
        *state = SessionState::default();
        Ok(())
    }

    pub fn profile(&self) -> Result<Profile> {
        Ok(self.lock()?.profile.clone())
    }

    pub fn token(&self) -> Result<String> {
        Ok(self.lock()?.profile.token.clone())
    }

    pub fn is_signed_in(&self) -> Result<bool> {
        Ok(self.lock()?.profile.is_signed_in())
    }

    pub fn balance(&self) -> Result<WalletBalance> {
        Ok(self.lock()?.balance)
    }

    pub fn summary(&self) -> Result<SessionSummary> {
        let state = self.lock()?;
        Ok(SessionSummary {
            signed_in: state.profile.is_signed_in(),
            profile: state.profile.clone(),
            balance: state.balance,
        })
    }

    pub fn set_phone_number(&self, phone: &str) -> Result<()> {
        let mut state = self.lock()?;
        self.store.set(KEY_PHONE_NUMBER, phone)?;
        state.profile.phone_number = phone.to_string();
        Ok(())
    }

    /// Replace the cached balance with a server-confirmed value
    pub fn reconcile_balance(&self, balance: WalletBalance) -> Result<()> {
        let mut state = self.lock()?;
        self.store.set(KEY_MONEY, &balance.to_string())?;
        state.balance = balance;
        Ok(())
    }

    /// Pay `price` out of the wallet
    pub fn debit(&self, price: Decimal) -> Result<WalletBalance> {
        let mut state = self.lock()?;
        let remaining = state
            .balance
            .checked_debit(price)
            .ok_or(Error::InsufficientFunds {
                balance: state.balance.amount(),
                price,
            })?;

        self.store.set(KEY_MONEY, &remaining.to_string())?;
        state.balance = remaining;
        Ok(remaining)
    }
}
