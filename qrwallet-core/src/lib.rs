//! QR Wallet Core - wallet top-up by redeem code
//!
//! This crate implements the core logic following hexagonal architecture:
//!
//! - **domain**: Core entities (WalletBalance, RedeemCode, FlowState, etc.)
//! - **ports**: Trait definitions for external dependencies (LocalStore, WalletBackend, MediaCaptureSource)
//! - **services**: Business logic orchestration (top-up flow, session, ledger)
//! - **adapters**: Concrete implementations (DuckDB, HTTP, image frames)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbStore;
use adapters::http_wallet::HttpWalletBackend;
use config::Config;
use ports::{LocalStore, MediaCaptureSource, WalletBackend};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    CaptureMethod, FlowState, Notice, NoticeKind, Profile, RedemptionRecord, SubmitOutcome,
    WalletBalance,
};

/// Main context for wallet operations
///
/// Holds the local store, configuration and services for one wallet
/// directory.
pub struct WalletContext {
    pub config: Config,
    pub wallet_dir: PathBuf,
    pub store: Arc<DuckDbStore>,
    pub session: Arc<UserSession>,
    pub ledger: Arc<RedemptionLedger>,
    pub wallet_service: Arc<WalletService>,
    pub logger: Option<Arc<LoggingService>>,
}

impl WalletContext {
    /// Open the wallet in `wallet_dir`
    pub fn new(wallet_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        std::fs::create_dir_all(wallet_dir)?;
        let config = Config::load(wallet_dir)?;

        let store = Arc::new(DuckDbStore::new(&wallet_dir.join("wallet.duckdb"))?);
        store.ensure_schema()?;

        let local: Arc<dyn LocalStore> = store.clone();
        let session = Arc::new(UserSession::load(Arc::clone(&local))?);
        let ledger = Arc::new(RedemptionLedger::new(local));

        let backend: Arc<dyn WalletBackend> = Arc::new(HttpWalletBackend::new(
            &config.api_base_url,
            &session.token()?,
            &config.lang,
            config.request_timeout,
        )?);
        let wallet_service = Arc::new(WalletService::new(
            backend,
            Arc::clone(&session),
            config.request_timeout,
        ));

        Ok(Self {
            config,
            wallet_dir: wallet_dir.to_path_buf(),
            store,
            session,
            ledger,
            wallet_service,
            logger,
        })
    }

    /// A fresh top-up dialog using `camera` for the scan path
    pub fn topup_flow(&self, camera: Arc<dyn MediaCaptureSource>) -> WalletTopUpFlow {
        let flow = WalletTopUpFlow::new(
            Arc::clone(&self.wallet_service),
            Arc::clone(&self.ledger),
            camera,
        )
        .with_frame_interval(self.config.frame_interval);

        match &self.logger {
            Some(logger) => flow.with_logger(Arc::clone(logger)),
            None => flow,
        }
    }
}
