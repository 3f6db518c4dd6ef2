//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The flow and the
//! services depend only on these traits, not on concrete implementations.

mod local_store;
mod media;
mod wallet_backend;

pub use local_store::LocalStore;
pub use media::{CaptureStream, MediaCaptureSource};
pub use wallet_backend::{ApiEnvelope, UserInfo, WalletBackend};
