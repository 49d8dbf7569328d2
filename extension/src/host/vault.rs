// Vault bridge: the compiled vault module, exposed by the background glue as the
// global `keylockBridge`. Every function returns a promise of a string.

use async_trait::async_trait;
use autofill_core::error::{BridgeError, Result};
use autofill_core::vault::VaultBridge;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::js_error;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = keylockBridge, catch)]
    fn connect_to_rkl() -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = keylockBridge, catch)]
    fn get_all() -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = keylockBridge, catch)]
    fn get_filtered(filter: &str) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = keylockBridge, catch)]
    fn get_decrypted(name: &str) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = keylockBridge, catch)]
    fn reset_pake() -> std::result::Result<js_sys::Promise, JsValue>;
}

pub struct WasmVault;

async fn call(
    promise: std::result::Result<js_sys::Promise, JsValue>,
) -> std::result::Result<String, String> {
    let value = JsFuture::from(promise.map_err(|e| js_error(&e))?)
        .await
        .map_err(|e| js_error(&e))?;
    value
        .as_string()
        .ok_or_else(|| "Vault bridge returned a non-string value".to_string())
}

#[async_trait(?Send)]
impl VaultBridge for WasmVault {
    async fn connect(&self) -> Result<String> {
        log::info!("Connecting to vault");
        call(connect_to_rkl()).await.map_err(BridgeError::ConnectionFailed)
    }

    async fn list_all(&self) -> Result<String> {
        call(get_all()).await.map_err(BridgeError::VaultCallFailed)
    }

    async fn list_filtered(&self, hostname: &str) -> Result<String> {
        call(get_filtered(hostname)).await.map_err(BridgeError::VaultCallFailed)
    }

    async fn decrypt(&self, name: &str) -> Result<String> {
        call(get_decrypted(name)).await.map_err(BridgeError::VaultCallFailed)
    }

    async fn reset(&self) -> Result<String> {
        call(reset_pake()).await.map_err(BridgeError::VaultCallFailed)
    }
}
