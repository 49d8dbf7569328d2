// In-memory stand-ins for the browser and the vault, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::task::Poll;

use async_trait::async_trait;
use futures::future;
use serde_json::Value;

use crate::content::FocusedField;
use crate::error::{BridgeError, Result};
use crate::host::{BackgroundClient, MenuHost, TabMessenger};
use crate::menu::MenuItem;
use crate::orchestrator::BackgroundOrchestrator;
use crate::protocol::{reply_channel, FillCommand, Reply, Request, Timer};
use crate::store::PreferenceStore;
use crate::vault::VaultBridge;

/// Give other joined futures a turn, the way a real host round-trip would.
pub async fn yield_now() {
    let mut yielded = false;
    future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn put(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }
}

#[async_trait(?Send)]
impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        yield_now().await;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        yield_now().await;
        self.put(key, value);
        Ok(())
    }
}

pub struct FakeVault {
    reachable: bool,
    all: String,
    filtered: HashMap<String, String>,
    decrypted: String,
    fail_lists: Cell<bool>,
    calls: RefCell<HashMap<&'static str, usize>>,
    last_decrypted: RefCell<Option<String>>,
}

impl Default for FakeVault {
    fn default() -> Self {
        Self {
            reachable: true,
            all: "[]".to_string(),
            filtered: HashMap::new(),
            decrypted: "[]".to_string(),
            fail_lists: Cell::new(false),
            calls: RefCell::new(HashMap::new()),
            last_decrypted: RefCell::new(None),
        }
    }
}

impl FakeVault {
    pub fn with_entries(json: &str) -> Self {
        Self {
            all: json.to_string(),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    pub fn filtering(mut self, hostname: &str, json: &str) -> Self {
        self.filtered.insert(hostname.to_string(), json.to_string());
        self
    }

    pub fn decrypting(mut self, json: &str) -> Self {
        self.decrypted = json.to_string();
        self
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.set(fail);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.borrow().get(op).copied().unwrap_or(0)
    }

    pub fn last_decrypted(&self) -> Option<String> {
        self.last_decrypted.borrow().clone()
    }

    fn record(&self, op: &'static str) {
        *self.calls.borrow_mut().entry(op).or_insert(0) += 1;
    }

    fn list(&self, json: &str) -> Result<String> {
        if self.fail_lists.get() {
            Err(BridgeError::VaultCallFailed("error decoding response body".to_string()))
        } else {
            Ok(json.to_string())
        }
    }
}

#[async_trait(?Send)]
impl VaultBridge for FakeVault {
    async fn connect(&self) -> Result<String> {
        self.record("connect");
        yield_now().await;
        if self.reachable {
            Ok(Reply::OK.to_string())
        } else {
            Err(BridgeError::ConnectionFailed("connection refused".to_string()))
        }
    }

    async fn list_all(&self) -> Result<String> {
        self.record("list_all");
        self.list(&self.all)
    }

    async fn list_filtered(&self, hostname: &str) -> Result<String> {
        self.record("list_filtered");
        let json = self.filtered.get(hostname).map_or("[]", String::as_str);
        self.list(json)
    }

    async fn decrypt(&self, name: &str) -> Result<String> {
        self.record("decrypt");
        *self.last_decrypted.borrow_mut() = Some(name.to_string());
        self.list(&self.decrypted)
    }

    async fn reset(&self) -> Result<String> {
        self.record("reset");
        Ok(Reply::OK.to_string())
    }
}

#[derive(Default)]
pub struct FakeTabs {
    failing: bool,
    sent: RefCell<Vec<(i32, FillCommand)>>,
}

impl FakeTabs {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(i32, FillCommand)> {
        self.sent.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TabMessenger for FakeTabs {
    async fn send_fill(&self, tab_id: i32, command: &FillCommand) -> Result<bool> {
        if self.failing {
            return Err(BridgeError::Messaging(
                "Could not establish connection. Receiving end does not exist.".to_string(),
            ));
        }
        self.sent.borrow_mut().push((tab_id, command.clone()));
        Ok(true)
    }
}

#[derive(Default)]
pub struct FakeMenus {
    items: RefCell<Vec<MenuItem>>,
    conflicts: Cell<usize>,
    refreshes: Cell<usize>,
}

impl FakeMenus {
    pub fn items(&self) -> Vec<MenuItem> {
        self.items.borrow().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.items.borrow().iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn conflicts(&self) -> usize {
        self.conflicts.get()
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.get()
    }
}

#[async_trait(?Send)]
impl MenuHost for FakeMenus {
    async fn remove_all(&self) -> Result<()> {
        self.items.borrow_mut().clear();
        Ok(())
    }

    async fn create(&self, item: &MenuItem) -> Result<()> {
        if self.items.borrow().iter().any(|i| i.id == item.id) {
            self.conflicts.set(self.conflicts.get() + 1);
            return Err(BridgeError::MenuRegistrationConflict(item.id.clone()));
        }
        self.items.borrow_mut().push(item.clone());
        Ok(())
    }

    fn refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }
}

pub struct FakeField {
    tag: String,
    input_type: Option<String>,
    attribute: RefCell<Option<String>>,
    property: RefCell<Option<String>>,
}

impl FakeField {
    pub fn input(input_type: Option<&str>) -> Self {
        Self {
            input_type: input_type.map(str::to_string),
            ..Self::element("INPUT")
        }
    }

    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            input_type: None,
            attribute: RefCell::new(None),
            property: RefCell::new(None),
        }
    }

    pub fn attribute(&self) -> Option<String> {
        self.attribute.borrow().clone()
    }

    pub fn property(&self) -> Option<String> {
        self.property.borrow().clone()
    }
}

impl FocusedField for FakeField {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn input_type(&self) -> Option<String> {
        self.input_type.clone()
    }

    fn set_value_attribute(&self, value: &str) -> Result<()> {
        *self.attribute.borrow_mut() = Some(value.to_string());
        Ok(())
    }

    fn set_value_property(&self, value: &str) {
        *self.property.borrow_mut() = Some(value.to_string());
    }
}

pub struct ImmediateTimer;

impl Timer for ImmediateTimer {
    type Delay = future::Ready<()>;

    fn delay(&self, _ms: u32) -> Self::Delay {
        future::ready(())
    }
}

pub struct NeverTimer;

impl Timer for NeverTimer {
    type Delay = future::Pending<()>;

    fn delay(&self, _ms: u32) -> Self::Delay {
        future::pending()
    }
}

/// Popup-side client wired straight into a background orchestrator.
pub struct LoopbackClient {
    background: BackgroundOrchestrator<FakeVault, FakeTabs>,
    requests: RefCell<Vec<Request>>,
}

impl LoopbackClient {
    pub fn new(background: BackgroundOrchestrator<FakeVault, FakeTabs>) -> Self {
        Self {
            background,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn background(&self) -> &BackgroundOrchestrator<FakeVault, FakeTabs> {
        &self.background
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BackgroundClient for LoopbackClient {
    async fn send(&self, request: &Request) -> Result<Reply> {
        self.requests.borrow_mut().push(request.clone());
        let (responder, pending) = reply_channel();
        self.background.dispatch(request.clone(), responder).await;
        pending.wait().await
    }
}

/// A background that never answers.
pub struct SilentClient;

#[async_trait(?Send)]
impl BackgroundClient for SilentClient {
    async fn send(&self, _request: &Request) -> Result<Reply> {
        future::pending().await
    }
}
