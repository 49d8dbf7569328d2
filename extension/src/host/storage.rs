// browser.storage.local integration for the remembered entries.

use async_trait::async_trait;
use autofill_core::error::{BridgeError, Result};
use autofill_core::store::PreferenceStore;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{from_js, js_error, to_js};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["browser", "storage", "local"], js_name = get)]
    fn storage_get(keys: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["browser", "storage", "local"], js_name = set)]
    fn storage_set(items: JsValue) -> js_sys::Promise;
}

pub struct BrowserStorage;

impl BrowserStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BrowserStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_error(err: JsValue) -> BridgeError {
    BridgeError::Storage(js_error(&err))
}

#[async_trait(?Send)]
impl PreferenceStore for BrowserStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let keys = js_sys::Array::new();
        keys.push(&key.into());

        let result = JsFuture::from(storage_get(keys.into()))
            .await
            .map_err(storage_error)?;
        let value = js_sys::Reflect::get(&result, &key.into()).map_err(storage_error)?;

        if value.is_undefined() || value.is_null() {
            Ok(None)
        } else {
            from_js(&value).map(Some).map_err(storage_error)
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &key.into(), &to_js(&value).map_err(storage_error)?)
            .map_err(storage_error)?;

        JsFuture::from(storage_set(obj.into()))
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
