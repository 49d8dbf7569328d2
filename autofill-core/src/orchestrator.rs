// Background orchestrator
//
// Single owner of the vault connection. Popup requests and menu events all go
// through here; vault calls are serialized on `gate`, so a list that arrives while
// a connect is in flight waits for it instead of racing it.

use std::cell::{Cell, RefCell};

use futures::lock::Mutex;

use crate::entry::{parse_entries, VaultEntry};
use crate::error::{BridgeError, Result};
use crate::host::TabMessenger;
use crate::protocol::{FillCommand, Reply, Request, Responder};
use crate::vault::VaultBridge;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// An established vault connection. Exists only between a successful connect and
/// the next reset or failed vault call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Decrypt found nothing under that name; the tab was not messaged.
    NoMatch,
    Filled {
        /// More than one entry matched and the first was used.
        ambiguous: bool,
        /// Whether the content script answered.
        acknowledged: bool,
    },
}

pub struct BackgroundOrchestrator<V, T> {
    vault: V,
    tabs: T,
    state: Cell<ConnectionState>,
    session: RefCell<Option<Session>>,
    generation: Cell<u64>,
    gate: Mutex<()>,
}

impl<V: VaultBridge, T: TabMessenger> BackgroundOrchestrator<V, T> {
    pub fn new(vault: V, tabs: T) -> Self {
        Self {
            vault,
            tabs,
            state: Cell::new(ConnectionState::Disconnected),
            session: RefCell::new(None),
            generation: Cell::new(0),
            gate: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    /// Route one popup request and answer it through `responder`.
    pub async fn dispatch(&self, request: Request, responder: Responder<Reply>) {
        let reply = self.handle_request(&request).await;
        log::debug!("Replying to {:?}: {}", request, reply.response);
        responder.reply(reply);
    }

    /// Failures come back as the reply text, never as an error.
    pub async fn handle_request(&self, request: &Request) -> Reply {
        match request {
            Request::Connect => Reply::new(self.handle_connect_request().await),
            Request::GetAll => self.handle_list_all_request().await.into(),
            Request::Reset => self.handle_reset_request().await.into(),
        }
    }

    /// `"OK"` on success (including when already connected), the error text otherwise.
    pub async fn handle_connect_request(&self) -> String {
        match self.ensure_connected().await {
            Ok(()) => Reply::OK.to_string(),
            Err(e) => {
                log::error!("Error connecting to vault: {}", e);
                e.to_string()
            }
        }
    }

    pub async fn handle_list_all_request(&self) -> Result<String> {
        log::info!("Getting all entries");
        let _gate = self.gate.lock().await;
        self.require_session()?;

        let result = self.vault.list_all().await;
        self.check_vault_result(result).await
    }

    /// Tear down the session on both sides.
    pub async fn handle_reset_request(&self) -> Result<String> {
        let _gate = self.gate.lock().await;
        self.teardown();
        self.vault.reset().await?;
        log::info!("Vault session reset");
        Ok(Reply::OK.to_string())
    }

    pub async fn ensure_connected(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        self.connect_locked().await
    }

    /// Entries for `hostname`, connecting first if needed.
    pub async fn list_filtered(&self, hostname: &str) -> Result<Vec<VaultEntry>> {
        log::info!("Getting entries using filter: {}", hostname);
        let _gate = self.gate.lock().await;
        self.connect_locked().await?;

        let result = self.vault.list_filtered(hostname).await;
        let json = self.check_vault_result(result).await?;
        parse_entries(&json)
    }

    /// Decrypt the clicked entry and send its credentials to `tab_id`.
    pub async fn handle_menu_click(&self, menu_item_id: &str, tab_id: i32) -> Result<ClickOutcome> {
        log::info!("Getting decrypted with name: {}", menu_item_id);

        let entries = {
            let _gate = self.gate.lock().await;
            self.connect_locked().await?;
            let result = self.vault.decrypt(menu_item_id).await;
            parse_entries(&self.check_vault_result(result).await?)?
        };

        let Some(first) = entries.first() else {
            log::info!("No entry named '{}', nothing to fill", menu_item_id);
            return Ok(ClickOutcome::NoMatch);
        };

        let ambiguous = entries.len() > 1;
        if ambiguous {
            log::warn!(
                "{}; using the first one",
                BridgeError::AmbiguousEntry {
                    name: menu_item_id.to_string(),
                    count: entries.len(),
                }
            );
        }

        let pass = first.pass.clone().ok_or_else(|| {
            BridgeError::VaultCallFailed(format!("decrypt returned no password for '{}'", first.name))
        })?;
        let command = FillCommand::Credentials {
            user: first.user.clone(),
            pass,
        };

        let acknowledged = match self.tabs.send_fill(tab_id, &command).await {
            Ok(ack) => ack,
            Err(e) => {
                log::error!("Error sending fill to tab {}: {}", tab_id, e);
                false
            }
        };

        Ok(ClickOutcome::Filled {
            ambiguous,
            acknowledged,
        })
    }

    fn require_session(&self) -> Result<()> {
        if self.session.borrow().is_some() {
            Ok(())
        } else {
            Err(BridgeError::NotConnected)
        }
    }

    // Caller holds `gate`.
    async fn connect_locked(&self) -> Result<()> {
        if self.session.borrow().is_some() {
            log::info!("Vault session already established");
            return Ok(());
        }

        self.state.set(ConnectionState::Connecting);
        match self.vault.connect().await {
            Ok(response) if response == Reply::OK => {
                let generation = self.generation.get() + 1;
                self.generation.set(generation);
                *self.session.borrow_mut() = Some(Session { generation });
                self.state.set(ConnectionState::Connected);
                log::info!("Connected to vault (session {})", generation);
                Ok(())
            }
            Ok(other) => {
                self.teardown();
                Err(BridgeError::ConnectionFailed(other))
            }
            Err(BridgeError::ConnectionFailed(msg)) => {
                self.teardown();
                Err(BridgeError::ConnectionFailed(msg))
            }
            Err(e) => {
                self.teardown();
                Err(BridgeError::ConnectionFailed(e.to_string()))
            }
        }
    }

    // A failed vault call invalidates the session on both sides so the next
    // connect starts from scratch.
    async fn check_vault_result(&self, result: Result<String>) -> Result<String> {
        if let Err(ref e) = result {
            log::error!("Vault call failed: {}", e);
            if matches!(e, BridgeError::VaultCallFailed(_)) {
                self.teardown();
                if let Err(reset_err) = self.vault.reset().await {
                    log::error!("Error resetting vault session: {}", reset_err);
                }
            }
        }
        result
    }

    fn teardown(&self) {
        *self.session.borrow_mut() = None;
        self.state.set(ConnectionState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeTabs, FakeVault};
    use crate::protocol::reply_channel;

    fn orchestrator(vault: FakeVault) -> BackgroundOrchestrator<FakeVault, FakeTabs> {
        BackgroundOrchestrator::new(vault, FakeTabs::default())
    }

    #[tokio::test]
    async fn test_list_before_connect_never_reaches_vault() {
        let orch = orchestrator(FakeVault::with_entries(r#"[{"name":"a","user":"b"}]"#));

        let result = orch.handle_list_all_request().await;

        assert_eq!(result, Err(BridgeError::NotConnected));
        assert_eq!(orch.vault().calls("list_all"), 0);
    }

    #[tokio::test]
    async fn test_connect_then_list() {
        let json = r#"[{"name":"a","user":"b"}]"#;
        let orch = orchestrator(FakeVault::with_entries(json));

        assert_eq!(orch.handle_connect_request().await, "OK");
        assert_eq!(orch.state(), ConnectionState::Connected);
        assert_eq!(orch.handle_list_all_request().await.unwrap(), json);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let orch = orchestrator(FakeVault::default());

        assert_eq!(orch.handle_connect_request().await, "OK");
        assert_eq!(orch.handle_connect_request().await, "OK");
        let (a, b) = futures::join!(orch.handle_connect_request(), orch.handle_connect_request());

        assert_eq!((a.as_str(), b.as_str()), ("OK", "OK"));
        assert_eq!(orch.vault().calls("connect"), 1);
        assert_eq!(orch.session(), Some(Session { generation: 1 }));
    }

    #[tokio::test]
    async fn test_failed_connect_stays_disconnected() {
        let orch = orchestrator(FakeVault::unreachable());

        let response = orch.handle_connect_request().await;

        assert_ne!(response, "OK");
        assert!(response.contains("connection refused"));
        assert_eq!(orch.state(), ConnectionState::Disconnected);
        assert!(orch.session().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_replies_exactly_once_with_error_text() {
        let orch = orchestrator(FakeVault::default());
        let (responder, pending) = reply_channel();

        orch.dispatch(Request::GetAll, responder).await;

        assert_eq!(pending.wait().await.unwrap(), Reply::new("Not connected to vault"));
    }

    #[tokio::test]
    async fn test_reset_tears_down_session() {
        let orch = orchestrator(FakeVault::default());
        orch.handle_connect_request().await;

        let reply = orch.handle_request(&Request::Reset).await;

        assert!(reply.is_ok());
        assert_eq!(orch.state(), ConnectionState::Disconnected);
        assert_eq!(orch.vault().calls("reset"), 1);

        orch.handle_connect_request().await;
        assert_eq!(orch.session(), Some(Session { generation: 2 }));
    }

    #[tokio::test]
    async fn test_vault_failure_drops_session() {
        let orch = orchestrator(FakeVault::default());
        orch.handle_connect_request().await;
        orch.vault().fail_lists(true);

        assert!(matches!(
            orch.handle_list_all_request().await,
            Err(BridgeError::VaultCallFailed(_))
        ));
        assert_eq!(orch.state(), ConnectionState::Disconnected);
        assert_eq!(orch.vault().calls("reset"), 1);
    }

    #[tokio::test]
    async fn test_click_with_no_match_sends_nothing() {
        let orch = orchestrator(FakeVault::default().decrypting("[]"));

        let outcome = orch.handle_menu_click("Site A", 7).await.unwrap();

        assert_eq!(outcome, ClickOutcome::NoMatch);
        assert!(orch.tabs().sent().is_empty());
    }

    #[tokio::test]
    async fn test_click_with_two_matches_uses_first() {
        let orch = orchestrator(FakeVault::default().decrypting(
            r#"[{"name":"Site A","user":"bob","pass":"one"},{"name":"Site A","user":"alice","pass":"two"}]"#,
        ));

        let outcome = orch.handle_menu_click("Site A", 7).await.unwrap();

        assert_eq!(
            outcome,
            ClickOutcome::Filled {
                ambiguous: true,
                acknowledged: true
            }
        );
        assert_eq!(
            orch.tabs().sent(),
            vec![(
                7,
                FillCommand::Credentials {
                    user: "bob".into(),
                    pass: "one".into()
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_click_connects_after_background_restart() {
        let orch = orchestrator(
            FakeVault::default().decrypting(r#"[{"name":"Site A","user":"bob","pass":"pw"}]"#),
        );
        assert_eq!(orch.state(), ConnectionState::Disconnected);

        orch.handle_menu_click("Site A", 1).await.unwrap();

        assert_eq!(orch.state(), ConnectionState::Connected);
        assert_eq!(orch.vault().last_decrypted(), Some("Site A".to_string()));
    }

    #[tokio::test]
    async fn test_unacknowledged_fill_is_swallowed() {
        let orch = BackgroundOrchestrator::new(
            FakeVault::default().decrypting(r#"[{"name":"x","user":"u","pass":"p"}]"#),
            FakeTabs::failing(),
        );

        let outcome = orch.handle_menu_click("x", 3).await.unwrap();

        assert_eq!(
            outcome,
            ClickOutcome::Filled {
                ambiguous: false,
                acknowledged: false
            }
        );
    }
}
