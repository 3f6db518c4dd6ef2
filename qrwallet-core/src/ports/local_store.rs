//! Local persistence port - key/value storage

use crate::domain::result::Result;

/// Small string key/value store for session data
///
/// Values are opaque strings; callers serialize structured values as JSON.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
