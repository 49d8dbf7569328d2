use async_trait::async_trait;
use autofill_core::error::{BridgeError, Result};
use autofill_core::host::BackgroundClient;
use autofill_core::protocol::{Reply, Request};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{from_js, js_error, to_js};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["browser", "runtime"], js_name = sendMessage, catch)]
    fn runtime_send_message(message: &JsValue) -> std::result::Result<js_sys::Promise, JsValue>;
}

/// popup -> background.
pub struct RuntimeClient;

#[async_trait(?Send)]
impl BackgroundClient for RuntimeClient {
    async fn send(&self, request: &Request) -> Result<Reply> {
        let messaging = |e: JsValue| BridgeError::Messaging(js_error(&e));

        let message = to_js(request).map_err(messaging)?;
        let promise = runtime_send_message(&message).map_err(messaging)?;
        let response = JsFuture::from(promise).await.map_err(messaging)?;

        // The background closed the channel without answering.
        if response.is_undefined() {
            return Err(BridgeError::ReplyDropped);
        }
        from_js(&response).map_err(messaging)
    }
}
