//! CLI command implementations

pub mod balance;
pub mod codes;
pub mod login;
pub mod logs;
pub mod setup;
pub mod status;
pub mod topup;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use qrwallet_core::services::{EntryPoint, LogEvent, LoggingService};
use qrwallet_core::WalletContext;

/// Environment variable to relocate the wallet directory
pub const WALLET_DIR_ENV: &str = "QRWALLET_DIR";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let wallet_dir = get_wallet_dir().ok()?;
    std::fs::create_dir_all(&wallet_dir).ok()?;
    LoggingService::new(&wallet_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the wallet directory from environment or default
pub fn get_wallet_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(WALLET_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".qrwallet"))
}

/// Open the wallet context
pub fn get_context(logger: Option<Arc<LoggingService>>) -> Result<WalletContext> {
    let wallet_dir = get_wallet_dir()?;
    WalletContext::new(&wallet_dir, logger)
        .with_context(|| format!("Failed to open wallet in {}", wallet_dir.display()))
}

/// Whether we may prompt the user
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}
