use bookhub_core::Session;

const SESSION_KEY: &str = "bookhub_session";

fn parse_session(raw: &str) -> Option<Session> {
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<Session>(raw).ok()
}

fn serialize_session(session: &Session) -> Result<String, String> {
    serde_json::to_string(session).map_err(|_| "failed to serialize session".to_string())
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    let window = web_sys::window().ok_or_else(|| "window is not available".to_string())?;
    window
        .local_storage()
        .map_err(|_| "failed to access localStorage".to_string())?
        .ok_or_else(|| "localStorage is not available".to_string())
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn load_session() -> Option<Session> {
    let raw = local_storage().ok()?.get_item(SESSION_KEY).ok()??;
    parse_session(&raw)
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn save_session(session: &Session) -> Result<(), String> {
    let raw = serialize_session(session)?;
    local_storage()?
        .set_item(SESSION_KEY, &raw)
        .map_err(|_| "failed to save session".to_string())
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn clear_session() -> Result<(), String> {
    local_storage()?
        .remove_item(SESSION_KEY)
        .map_err(|_| "failed to clear session".to_string())
}
