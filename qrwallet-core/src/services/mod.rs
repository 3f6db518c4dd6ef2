//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one concern of the top-up feature.

mod ledger;
pub mod logging;
pub mod migration;
pub mod qr;
pub mod scanner;
mod session;
pub mod topup;
mod wallet;

pub use ledger::{RedemptionLedger, KEY_USED_BARCODES};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use scanner::ScanTask;
pub use session::{LoginDetails, SessionSummary, UserSession};
pub use topup::WalletTopUpFlow;
pub use wallet::WalletService;
