use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Connection to vault failed: {0}")]
    ConnectionFailed(String),

    #[error("Not connected to vault")]
    NotConnected,

    #[error("Vault call failed: {0}")]
    VaultCallFailed(String),

    #[error("Malformed entry list: {0}")]
    MalformedEntries(String),

    /// Decrypt matched more than one entry. Logged, never returned to a caller.
    #[error("Entry '{name}' is ambiguous: {count} matches")]
    AmbiguousEntry { name: String, count: usize },

    /// Host refused a menu id that is already registered. Always suppressed.
    #[error("Menu item '{0}' is already registered")]
    MenuRegistrationConflict(String),

    #[error("Menu host error: {0}")]
    Menu(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Timed out after {0} ms waiting for reply")]
    Timeout(u32),

    #[error("Reply channel closed without a reply")]
    ReplyDropped,
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::MalformedEntries(err.to_string())
    }
}
