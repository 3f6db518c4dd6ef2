//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB and an in-memory map for the LocalStore port
//! - reqwest HTTP client for the WalletBackend port
//! - Image directory replay for the MediaCaptureSource port

pub mod duckdb;
pub mod frames;
pub mod http_wallet;
pub mod memory;

#[cfg(test)]
pub mod wallet_api_mock;
