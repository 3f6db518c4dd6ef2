//! Redemption ledger - codes this device has redeemed
//!
//! Purely informational. Nothing checks it before a submission; the server
//! is the authority on whether a code is still valid.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::domain::result::{Error, Result};
use crate::domain::{RedeemCode, RedemptionRecord, UsedCodes};
use crate::ports::LocalStore;

pub const KEY_USED_BARCODES: &str = "used_barcodes";

pub struct RedemptionLedger {
    store: Arc<dyn LocalStore>,
    // Serializes read-modify-write of the stored list
    write_lock: Mutex<()>,
}

impl RedemptionLedger {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<UsedCodes> {
        match self.store.get(KEY_USED_BARCODES)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(UsedCodes::default()),
        }
    }

    /// All recorded codes, oldest first
    pub fn records(&self) -> Result<Vec<RedemptionRecord>> {
        Ok(self.read()?.records().to_vec())
    }

    pub fn contains(&self, code: &str) -> Result<bool> {
        Ok(self.read()?.contains(code.trim()))
    }

    /// Record a redeemed code. Returns false if it was already there.
    pub fn record(&self, code: &RedeemCode) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| Error::Other(format!("Ledger lock poisoned: {}", e)))?;

        let mut used = self.read()?;
        if !used.insert(code, Utc::now()) {
            return Ok(false);
        }
        self.store
            .set(KEY_USED_BARCODES, &serde_json::to_string(&used)?)?;
        Ok(true)
    }
}
