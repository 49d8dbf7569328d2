// browser.menus integration (Firefox: supports onShown/refresh).

use async_trait::async_trait;
use autofill_core::error::{BridgeError, Result};
use autofill_core::host::MenuHost;
use autofill_core::menu::MenuItem;
use futures::channel::oneshot;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use super::{js_error, to_js};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["browser", "menus"], js_name = create, catch)]
    fn menus_create(props: &JsValue, callback: &js_sys::Function) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["browser", "menus"], js_name = removeAll)]
    fn menus_remove_all() -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "menus"], js_name = refresh)]
    fn menus_refresh() -> js_sys::Promise;
}

pub struct BrowserMenus;

/// `browser.runtime.lastError`, read inside a create callback.
fn last_error() -> Option<String> {
    let browser = js_sys::Reflect::get(&js_sys::global(), &"browser".into()).ok()?;
    let runtime = js_sys::Reflect::get(&browser, &"runtime".into()).ok()?;
    let error = js_sys::Reflect::get(&runtime, &"lastError".into()).ok()?;
    if error.is_undefined() || error.is_null() {
        None
    } else {
        Some(js_error(&error))
    }
}

fn is_duplicate_id(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already exists") || message.contains("duplicate id")
}

#[async_trait(?Send)]
impl MenuHost for BrowserMenus {
    async fn remove_all(&self) -> Result<()> {
        JsFuture::from(menus_remove_all())
            .await
            .map_err(|e| BridgeError::Menu(js_error(&e)))?;
        Ok(())
    }

    async fn create(&self, item: &MenuItem) -> Result<()> {
        let props = to_js(item).map_err(|e| BridgeError::Menu(js_error(&e)))?;

        // Reading lastError in the callback keeps the host from logging an
        // unchecked error for ids that survived a background restart.
        let (tx, rx) = oneshot::channel::<Option<String>>();
        let callback = Closure::once(move || {
            let _ = tx.send(last_error());
        });

        if let Err(e) = menus_create(&props, callback.as_ref().unchecked_ref()) {
            let message = js_error(&e);
            return Err(if is_duplicate_id(&message) {
                BridgeError::MenuRegistrationConflict(item.id.clone())
            } else {
                BridgeError::Menu(message)
            });
        }

        match rx.await {
            Ok(None) => Ok(()),
            Ok(Some(message)) if is_duplicate_id(&message) => {
                Err(BridgeError::MenuRegistrationConflict(item.id.clone()))
            }
            Ok(Some(message)) => Err(BridgeError::Menu(message)),
            Err(_) => Err(BridgeError::Menu("create callback never ran".to_string())),
        }
    }

    fn refresh(&self) {
        let refresh = JsFuture::from(menus_refresh());
        spawn_local(async move {
            // Rejected when the menu closed before the rebuild finished.
            if let Err(e) = refresh.await {
                log::debug!("Menu refresh skipped: {}", js_error(&e));
            }
        });
    }
}
