// Content script: writes fill commands from the background into the focused field.

use autofill_core::content::{FieldClassifier, FillResult, FocusedField};
use autofill_core::error::{BridgeError, Result};
use autofill_core::protocol::FillCommand;
use keylock_extension::host::{from_js, js_error};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Dummy main for binary target
fn main() {}

thread_local! {
    static CLASSIFIER: FieldClassifier = {
        let config = keylock_extension::init_context("content script");
        FieldClassifier::new(config.fill.username_input_types)
    };
}

struct DomField(web_sys::Element);

impl FocusedField for DomField {
    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn input_type(&self) -> Option<String> {
        self.0.get_attribute("type")
    }

    fn set_value_attribute(&self, value: &str) -> Result<()> {
        self.0
            .set_attribute("value", value)
            .map_err(|e| BridgeError::Messaging(js_error(&e)))
    }

    fn set_value_property(&self, value: &str) {
        if let Some(input) = self.0.dyn_ref::<web_sys::HtmlInputElement>() {
            input.set_value(value);
        }
    }
}

fn focused_field() -> Option<DomField> {
    let document = web_sys::window()?.document()?;
    document.active_element().map(DomField)
}

#[wasm_bindgen]
pub fn init_content_script() {
    CLASSIFIER.with(|_| ());
}

/// runtime.onMessage from the background. Always acknowledges.
#[wasm_bindgen]
pub fn handle_fill_message(message: JsValue) -> bool {
    let command = match from_js::<FillCommand>(&message) {
        Ok(command) => command,
        Err(e) => {
            log::error!("Ignoring malformed fill message: {}", js_error(&e));
            return true;
        }
    };

    let field = focused_field();
    let result = CLASSIFIER.with(|classifier| classifier.fill(field.as_ref(), &command));
    if let FillResult::Written { kind } = result {
        log::debug!("Filled focused {:?} field", kind);
    }

    true
}
