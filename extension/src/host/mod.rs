// Browser API bindings (WebExtensions `browser.*` namespace).
// Each submodule implements one autofill-core host trait.

pub mod menus;
pub mod runtime;
pub mod storage;
pub mod tabs;
pub mod vault;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use menus::BrowserMenus;
pub use runtime::RuntimeClient;
pub use storage::BrowserStorage;
pub use tabs::BrowserTabs;
pub use vault::WasmVault;

/// Timer for `with_timeout`, backed by `setTimeout`.
pub struct GlooTimer;

impl autofill_core::protocol::Timer for GlooTimer {
    type Delay = gloo_timers::future::TimeoutFuture;

    fn delay(&self, ms: u32) -> Self::Delay {
        gloo_timers::future::TimeoutFuture::new(ms)
    }
}

/// Best-effort text of a thrown JS value (`Error.message`, a plain string, or debug).
pub fn js_error(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    js_sys::Reflect::get(err, &"message".into())
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
    js_sys::JSON::parse(&json)
}

pub fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, JsValue> {
    let json = js_sys::JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| JsValue::from_str("Value is not JSON-serializable"))?;
    serde_json::from_str(&json).map_err(|e| JsValue::from_str(&format!("Parse error: {}", e)))
}
