// Popup controller
//
// Disconnected -> Connecting -> Connected | Disconnected. The popup only talks to
// the background through `BackgroundClient`, and every request is bounded by the
// configured reply timeout since the background may never answer.

use crate::entry::{parse_entries, render_label, VaultEntry};
use crate::error::{BridgeError, Result};
use crate::host::BackgroundClient;
use crate::protocol::{with_timeout, Reply, Request, Timer};
use crate::store::{PreferenceStore, RememberedEntries};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupView {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupRow {
    pub entry: VaultEntry,
    pub label: String,
    pub checked: bool,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupState {
    pub view: PopupView,
    pub rows: Vec<PopupRow>,
    filter: String,
}

impl PopupState {
    pub fn disconnected() -> Self {
        Self {
            view: PopupView::Disconnected,
            rows: Vec::new(),
            filter: String::new(),
        }
    }

    pub fn connecting() -> Self {
        Self {
            view: PopupView::Connecting,
            ..Self::disconnected()
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Show rows whose label contains `filter`, ignoring case. View-only.
    pub fn apply_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        let needle = filter.to_uppercase();
        for row in &mut self.rows {
            row.visible = row.label.to_uppercase().contains(&needle);
        }
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &PopupRow> {
        self.rows.iter().filter(|r| r.visible)
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) {
        for row in self.rows.iter_mut().filter(|r| r.entry.name == name) {
            row.checked = checked;
        }
    }
}

impl Default for PopupState {
    fn default() -> Self {
        Self::disconnected()
    }
}

pub struct PopupController<C, S, T> {
    client: C,
    remembered: RememberedEntries<S>,
    timer: T,
    timeout_ms: u32,
    label_template: String,
}

impl<C, S, T> PopupController<C, S, T>
where
    C: BackgroundClient,
    S: PreferenceStore,
    T: Timer,
{
    pub fn new(
        client: C,
        remembered: RememberedEntries<S>,
        timer: T,
        timeout_ms: u32,
        label_template: impl Into<String>,
    ) -> Self {
        Self {
            client,
            remembered,
            timer,
            timeout_ms,
            label_template: label_template.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Connect, then list. Any failure lands in the disconnected view.
    pub async fn open(&self) -> PopupState {
        if !self.connect().await {
            return PopupState::disconnected();
        }

        match self.fetch_rows().await {
            Ok(rows) => PopupState {
                view: PopupView::Connected,
                rows,
                filter: String::new(),
            },
            Err(e) => {
                log::error!("Error: {}", e);
                PopupState::disconnected()
            }
        }
    }

    pub async fn connect(&self) -> bool {
        log::debug!("Sending message to connect to vault");
        match self.request(&Request::Connect).await {
            Ok(reply) if reply.is_ok() => true,
            Ok(reply) => {
                log::error!("Error: {}", reply.response);
                false
            }
            Err(e) => {
                log::error!("Error: {}", e);
                false
            }
        }
    }

    pub async fn disconnect(&self) -> PopupState {
        match self.request(&Request::Reset).await {
            Ok(reply) if !reply.is_ok() => log::error!("Error: {}", reply.response),
            Ok(_) => {}
            Err(e) => log::error!("Error: {}", e),
        }
        PopupState::disconnected()
    }

    /// Persist a checkbox change. The caller mirrors it with `PopupState::set_checked`.
    pub async fn toggle(&self, entry: &VaultEntry, checked: bool) -> Result<()> {
        self.remembered.toggle(entry, checked).await?;
        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<PopupRow>> {
        let reply = self.request(&Request::GetAll).await?;
        // Background failures come back as plain text in place of the list.
        let entries = parse_entries(&reply.response).map_err(|e| {
            log::error!("Unexpected reply to getAll: {}", reply.response);
            match serde_json::from_str::<serde_json::Value>(&reply.response) {
                Ok(_) => e,
                Err(_) => BridgeError::Messaging(reply.response.clone()),
            }
        })?;
        let remembered = self.remembered.load().await?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let label = render_label(&self.label_template, &entry.name, &entry.user);
                log::debug!("Adding to list {}", label);
                PopupRow {
                    checked: remembered.iter().any(|r| r.name == entry.name),
                    entry,
                    label,
                    visible: true,
                }
            })
            .collect())
    }

    async fn request(&self, request: &Request) -> Result<Reply> {
        with_timeout(&self.timer, self.timeout_ms, self.client.send(request))
            .await
            .and_then(|reply| reply)
            .map_err(|e| match e {
                BridgeError::Timeout(_) | BridgeError::Messaging(_) => e,
                other => BridgeError::Messaging(other.to_string()),
            })
    }
}
