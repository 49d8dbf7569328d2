// Browser surfaces used by the background and popup contexts.

use async_trait::async_trait;

use crate::error::Result;
use crate::menu::MenuItem;
use crate::protocol::{FillCommand, Reply, Request};

/// The tab a menu event originated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabInfo {
    pub id: i32,
    pub url: Option<String>,
}

/// Context-menu API. The host cannot list what it holds, so callers only ever
/// clear and re-create.
#[async_trait(?Send)]
pub trait MenuHost {
    async fn remove_all(&self) -> Result<()>;

    /// `BridgeError::MenuRegistrationConflict` when the id already exists.
    async fn create(&self, item: &MenuItem) -> Result<()>;

    /// Re-render a menu that is currently open.
    fn refresh(&self);
}

/// background → content script.
#[async_trait(?Send)]
pub trait TabMessenger {
    /// Returns the content script's acknowledgement.
    async fn send_fill(&self, tab_id: i32, command: &FillCommand) -> Result<bool>;
}

/// popup → background.
#[async_trait(?Send)]
pub trait BackgroundClient {
    async fn send(&self, request: &Request) -> Result<Reply>;
}
