use async_trait::async_trait;
use autofill_core::error::{BridgeError, Result};
use autofill_core::host::TabMessenger;
use autofill_core::protocol::FillCommand;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{js_error, to_js};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["browser", "tabs"], js_name = sendMessage, catch)]
    fn tabs_send_message(tab_id: i32, message: &JsValue) -> std::result::Result<js_sys::Promise, JsValue>;
}

/// background -> content script in a given tab.
pub struct BrowserTabs;

#[async_trait(?Send)]
impl TabMessenger for BrowserTabs {
    async fn send_fill(&self, tab_id: i32, command: &FillCommand) -> Result<bool> {
        let messaging = |e: JsValue| BridgeError::Messaging(js_error(&e));

        let message = to_js(command).map_err(messaging)?;
        let promise = tabs_send_message(tab_id, &message).map_err(messaging)?;
        let response = JsFuture::from(promise).await.map_err(messaging)?;

        Ok(response.as_bool().unwrap_or(false))
    }
}
