use std::rc::Rc;

use autofill_core::{PopupController, PopupRow, PopupState, PopupView, RememberedEntries, VaultEntry};
use dioxus::prelude::*;

use crate::host::{BrowserStorage, GlooTimer, RuntimeClient};

type Controller = PopupController<RuntimeClient, BrowserStorage, GlooTimer>;

#[component]
fn App() -> Element {
    let mut state = use_signal(PopupState::disconnected);

    let controller = use_hook(|| {
        let config = crate::init_context("popup");
        Rc::new(Controller::new(
            RuntimeClient,
            RememberedEntries::new(BrowserStorage::new(), config.storage_key.clone()),
            GlooTimer,
            config.reply_timeout_ms,
            config.popup.label_template.clone(),
        ))
    });

    let ctrl_for_open = controller.clone();
    use_future(move || {
        let ctrl = ctrl_for_open.clone();
        async move {
            state.set(PopupState::connecting());
            state.set(ctrl.open().await);
        }
    });

    let ctrl_for_toggle = controller.clone();
    let toggle = move |(entry, checked): (VaultEntry, bool)| {
        let ctrl = ctrl_for_toggle.clone();
        spawn(async move {
            match ctrl.toggle(&entry, checked).await {
                Ok(()) => state.write().set_checked(&entry.name, checked),
                Err(e) => log::error!("Error: {}", e),
            }
        });
    };

    let ctrl_for_disconnect = controller.clone();
    let disconnect = move |_: MouseEvent| {
        let ctrl = ctrl_for_disconnect.clone();
        spawn(async move {
            state.set(ctrl.disconnect().await);
        });
    };

    let view = state.read().view;
    let rows = state.read().rows.clone();
    let filter = state.read().filter().to_string();

    rsx! {
        div { id: "disconnectedDiv",
            style: if view == PopupView::Connected { "display: none" } else { "" },
            p { class: "status",
                if view == PopupView::Connecting { "Connecting to rust-keylock..." } else { "Not connected to rust-keylock" }
            }
        }

        div { id: "connectedDiv",
            style: if view == PopupView::Connected { "" } else { "display: none" },
            input {
                id: "userInput",
                r#type: "text",
                placeholder: "Search..",
                value: "{filter}",
                oninput: move |e| state.write().apply_filter(&e.value()),
            }
            div { id: "passwordsDropdown", class: "show",
                table { class: "centered",
                    tbody {
                        for row in rows {
                            EntryRow { key: "{row.entry.name}", row: row.clone(), on_toggle: toggle.clone() }
                        }
                    }
                }
            }
            button { class: "disconnect", onclick: disconnect, "Disconnect" }
        }
    }
}

#[component]
fn EntryRow(row: PopupRow, on_toggle: EventHandler<(VaultEntry, bool)>) -> Element {
    let checked = row.checked;
    let entry = row.entry.clone();

    rsx! {
        tr { style: if row.visible { "" } else { "display: none" },
            td { class: "leftColumn", a { "{row.label}" } }
            td { class: "rightColumn",
                input {
                    r#type: "checkbox",
                    checked: checked,
                    // Checkbox events carry "true"/"false" for the box's new state.
                    onchange: move |e: FormEvent| {
                        let now_checked = e.value().parse().unwrap_or(!checked);
                        on_toggle.call((entry.clone(), now_checked));
                    },
                }
            }
        }
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run() {
    dioxus::launch(App);
}
