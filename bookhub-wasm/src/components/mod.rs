pub(crate) mod auth_panel;
pub(crate) mod create_post;
pub(crate) mod explorer_panel;
pub(crate) mod post_card;
pub(crate) mod post_detail;
pub(crate) mod posts_panel;
pub(crate) mod profile_panel;

use wasm_bindgen::JsValue;

/// Системный диалог подтверждения; без `window` действие отменяется.
pub(crate) fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

pub(crate) fn log_warning(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}
