// Context menu for editable and password fields.
//
// The host cannot enumerate its items, so each menu-shown event computes the
// desired set (`MenuPlan`) and applies it as remove-all + create. Re-registering an
// id the host still remembers from a previous background instance is expected and
// ignored.

use std::cell::Cell;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::entry::{render_label, RememberedEntry, VaultEntry};
use crate::error::BridgeError;
use crate::host::{MenuHost, TabInfo, TabMessenger};
use crate::orchestrator::{BackgroundOrchestrator, ClickOutcome};
use crate::store::{PreferenceStore, RememberedEntries};
use crate::vault::VaultBridge;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<String>,
}

/// Desired menu contents: vault matches first, then remembered entries. The two
/// sources are not deduplicated against each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuPlan {
    items: Vec<MenuItem>,
}

impl MenuPlan {
    pub fn build(
        filtered: &[VaultEntry],
        remembered: &[RememberedEntry],
        title_template: &str,
        contexts: &[String],
    ) -> Self {
        let item = |name: &str, user: &str| MenuItem {
            id: name.to_string(),
            title: render_label(title_template, name, user),
            contexts: contexts.to_vec(),
        };

        let items = filtered
            .iter()
            .map(|e| item(&e.name, &e.user))
            .chain(remembered.iter().map(|e| item(&e.name, &e.user)))
            .collect();

        Self { items }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Ids the host ends up showing (duplicates collapse).
    pub fn visible_ids(&self) -> BTreeSet<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }
}

pub struct ContextMenuManager<H, S> {
    host: H,
    remembered: RememberedEntries<S>,
    title_template: String,
    contexts: Vec<String>,
    cycle: Cell<u64>,
}

impl<H: MenuHost, S: PreferenceStore> ContextMenuManager<H, S> {
    pub fn new(
        host: H,
        remembered: RememberedEntries<S>,
        title_template: impl Into<String>,
        contexts: Vec<String>,
    ) -> Self {
        Self {
            host,
            remembered,
            title_template: title_template.into(),
            contexts,
            cycle: Cell::new(0),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Rebuild the whole menu for `tab`. Sources that fail contribute nothing.
    /// A newer menu-shown event supersedes this one mid-flight.
    pub async fn on_menu_shown<V, T>(
        &self,
        orchestrator: &BackgroundOrchestrator<V, T>,
        tab: &TabInfo,
    ) -> MenuPlan
    where
        V: VaultBridge,
        T: TabMessenger,
    {
        let cycle = self.cycle.get() + 1;
        self.cycle.set(cycle);

        if let Err(e) = self.host.remove_all().await {
            log::error!("Error clearing context menu: {}", e);
        }

        let filtered = match tab.url.as_deref().and_then(hostname) {
            Some(host) => orchestrator.list_filtered(&host).await.unwrap_or_else(|e| {
                log::error!("Error getting entries for {}: {}", host, e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let remembered = self.remembered.load().await.unwrap_or_else(|e| {
            log::error!("Error reading remembered entries: {}", e);
            Vec::new()
        });

        let plan = MenuPlan::build(&filtered, &remembered, &self.title_template, &self.contexts);

        for item in plan.items() {
            if self.cycle.get() != cycle {
                log::debug!("Menu cycle {} superseded", cycle);
                return plan;
            }
            match self.host.create(item).await {
                Ok(()) => {}
                Err(BridgeError::MenuRegistrationConflict(id)) => {
                    log::debug!("Menu item '{}' already registered", id);
                }
                Err(e) => log::error!("Error creating menu item '{}': {}", item.id, e),
            }
        }

        self.host.refresh();
        plan
    }

    pub async fn on_menu_clicked<V, T>(
        &self,
        orchestrator: &BackgroundOrchestrator<V, T>,
        menu_item_id: &str,
        tab: &TabInfo,
    ) -> Option<ClickOutcome>
    where
        V: VaultBridge,
        T: TabMessenger,
    {
        match orchestrator.handle_menu_click(menu_item_id, tab.id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::error!("Error filling '{}': {}", menu_item_id, e);
                None
            }
        }
    }
}

/// Host part of a page URL (lowercased by the parser). No subdomain folding.
pub fn hostname(url: &str) -> Option<String> {
    url::Url::parse(url).ok()?.host_str().map(str::to_owned)
}
