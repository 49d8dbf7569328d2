use async_trait::async_trait;

use crate::error::Result;

/// The compiled vault module. Every call returns the bridge's raw string: `"OK"`
/// for connect/reset, a JSON array of entries for the list calls.
///
/// Implementations map their own failures to `BridgeError::ConnectionFailed`
/// (connect) or `BridgeError::VaultCallFailed` (everything else).
#[async_trait(?Send)]
pub trait VaultBridge {
    async fn connect(&self) -> Result<String>;

    async fn list_all(&self) -> Result<String>;

    /// Entries whose origin matches `hostname` exactly.
    async fn list_filtered(&self, hostname: &str) -> Result<String>;

    /// Entries named `name`, with `pass` populated.
    async fn decrypt(&self, name: &str) -> Result<String>;

    /// Drop the bridge's session so the next connect starts fresh.
    async fn reset(&self) -> Result<String>;
}
