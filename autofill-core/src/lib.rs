//! Keylock autofill core
//!
//! Platform-independent half of the browser extension: the message protocol spoken
//! between popup, background and content script, the background session, the context
//! menu builder, the remembered-entries store and the popup state machine.
//!
//! Everything that touches the browser sits behind a trait (`VaultBridge`,
//! `PreferenceStore`, `MenuHost`, `TabMessenger`, `BackgroundClient`, `FocusedField`)
//! so the wasm crate only supplies bindings.

pub mod config;
pub mod content;
pub mod entry;
pub mod error;
pub mod host;
pub mod menu;
pub mod orchestrator;
pub mod popup;
pub mod protocol;
pub mod store;
pub mod vault;

#[cfg(test)]
pub(crate) mod fakes;

pub use config::ExtensionConfig;
pub use entry::{RememberedEntry, VaultEntry};
pub use error::{BridgeError, Result};
pub use menu::{ContextMenuManager, MenuItem, MenuPlan};
pub use orchestrator::{BackgroundOrchestrator, ClickOutcome, ConnectionState};
pub use popup::{PopupController, PopupRow, PopupState, PopupView};
pub use protocol::{FillCommand, Reply, Request};
pub use store::RememberedEntries;
pub use vault::VaultBridge;
