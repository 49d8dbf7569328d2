// Background script for the Keylock autofill extension
// Business logic lives in autofill-core; this binary owns the one orchestrator
// and exposes the listeners the JavaScript glue registers with the browser.

use std::rc::Rc;

use autofill_core::host::TabInfo;
use autofill_core::protocol::{reply_channel, Reply, Request};
use autofill_core::{BackgroundOrchestrator, ContextMenuManager, RememberedEntries};
use keylock_extension::host::{
    from_js, js_error, to_js, BrowserMenus, BrowserStorage, BrowserTabs, WasmVault,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

// Dummy main for binary target
fn main() {}

struct Background {
    orchestrator: BackgroundOrchestrator<WasmVault, BrowserTabs>,
    menus: ContextMenuManager<BrowserMenus, BrowserStorage>,
}

thread_local! {
    static BACKGROUND: Rc<Background> = Rc::new(Background::new());
}

impl Background {
    fn new() -> Self {
        let config = keylock_extension::init_context("background");
        Self {
            orchestrator: BackgroundOrchestrator::new(WasmVault, BrowserTabs),
            menus: ContextMenuManager::new(
                BrowserMenus,
                RememberedEntries::new(BrowserStorage::new(), config.storage_key.clone()),
                config.menu.title_template.clone(),
                config.menu.contexts.clone(),
            ),
        }
    }
}

fn background() -> Rc<Background> {
    BACKGROUND.with(Rc::clone)
}

fn tab_info(tab: &JsValue) -> Option<TabInfo> {
    let id = js_sys::Reflect::get(tab, &"id".into()).ok()?.as_f64()? as i32;
    let url = js_sys::Reflect::get(tab, &"url".into())
        .ok()
        .and_then(|u| u.as_string());
    Some(TabInfo { id, url })
}

/// Initialize the background context. Called once from the glue.
#[wasm_bindgen]
pub fn init_background() {
    // Builds the orchestrator and starts logging.
    let _ = background();
    log::info!("Keylock background initialized");
}

/// runtime.onMessage from the popup. The returned promise resolves with exactly
/// one `{response}` object; the glue hands it to `sendResponse`.
#[wasm_bindgen]
pub fn handle_message(message: JsValue) -> js_sys::Promise {
    let bg = background();
    let request = from_js::<Request>(&message);

    future_to_promise(async move {
        let reply = match request {
            Ok(request) => {
                log::debug!("Received {:?}", request);
                let (responder, pending) = reply_channel();
                bg.orchestrator.dispatch(request, responder).await;
                pending
                    .wait()
                    .await
                    .unwrap_or_else(|e| Reply::new(e.to_string()))
            }
            Err(e) => Reply::new(format!("Unknown message: {}", js_error(&e))),
        };
        to_js(&reply)
    })
}

/// menus.onShown: rebuild the menu for the tab under the cursor.
#[wasm_bindgen]
pub fn handle_menu_shown(tab: JsValue) -> js_sys::Promise {
    let bg = background();

    future_to_promise(async move {
        match tab_info(&tab) {
            Some(tab) => {
                let plan = bg.menus.on_menu_shown(&bg.orchestrator, &tab).await;
                log::debug!("Menu rebuilt with {} items", plan.items().len());
            }
            None => log::debug!("Menu shown outside a tab"),
        }
        Ok(JsValue::UNDEFINED)
    })
}

/// menus.onClicked: fill the clicked entry into the originating tab.
#[wasm_bindgen]
pub fn handle_menu_clicked(info: JsValue, tab: JsValue) -> js_sys::Promise {
    let bg = background();

    future_to_promise(async move {
        let menu_item_id = js_sys::Reflect::get(&info, &"menuItemId".into())
            .ok()
            .and_then(|id| id.as_string());

        match (menu_item_id, tab_info(&tab)) {
            (Some(id), Some(tab)) => {
                if let Some(outcome) = bg.menus.on_menu_clicked(&bg.orchestrator, &id, &tab).await {
                    log::debug!("Menu click '{}': {:?}", id, outcome);
                }
            }
            _ => log::error!("Menu click without item id or tab"),
        }
        Ok(JsValue::UNDEFINED)
    })
}
