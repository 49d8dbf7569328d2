// Keylock autofill browser extension
// All business logic lives in autofill-core; this crate is the wasm glue to the
// browser APIs. The popup (Dioxus) is the cdylib, background and content script
// are separate binaries built without the `popup` feature.

pub mod host;

#[cfg(feature = "popup")]
mod popup;

use autofill_core::ExtensionConfig;

const CONFIG: &str = include_str!("../keylock.toml");

/// Load the bundled config and start logging for one extension context.
pub fn init_context(context: &str) -> ExtensionConfig {
    let (config, invalid) = match ExtensionConfig::from_toml_str(CONFIG) {
        Ok(config) => (config, None),
        Err(e) => (ExtensionConfig::default(), Some(e)),
    };

    wasm_logger::init(wasm_logger::Config::new(config.level()));
    if let Some(e) = invalid {
        log::error!("Invalid keylock.toml, using defaults: {:#}", e);
    }
    log::info!("Keylock {} starting...", context);

    config
}
