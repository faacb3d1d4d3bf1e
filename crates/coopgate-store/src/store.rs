//! State-repository seam
//!
//! Every persisted flag the shell reads or writes goes through this trait,
//! so the router takes an injected store instead of reaching for process
//! globals, and tests substitute an in-memory fake.

use coopgate_core::{ConsentState, Destination, LaunchMode, Result};

/// Persisted key names, exactly as the shell stores them on disk.
pub mod keys {
    pub const LAUNCH_MODE: &str = "chick_mode";
    pub const SAVED_PATH: &str = "saved_path";
    pub const SAVED_EXPIRES: &str = "saved_expires";
    pub const ALLOWED_ALERTS: &str = "allowed_alerts";
    pub const DENIED_ALERTS: &str = "denied_alerts";
    pub const LAST_ALERT_PROMPT: &str = "last_alert_prompt";
    pub const HAS_LAUNCHED_BEFORE: &str = "hasLaunchedBefore";
    pub const PUSH_TOKEN: &str = "push_token";
    pub const PENDING_LINK: &str = "temp_path";

    pub const ALL: [&str; 9] = [
        LAUNCH_MODE,
        SAVED_PATH,
        SAVED_EXPIRES,
        ALLOWED_ALERTS,
        DENIED_ALERTS,
        LAST_ALERT_PROMPT,
        HAS_LAUNCHED_BEFORE,
        PUSH_TOKEN,
        PENDING_LINK,
    ];
}

/// Typed access to the persisted shell state.
pub trait StateStore: Send + Sync {
    /// `chick_mode` — launch preference, unset on a fresh install.
    fn launch_mode(&self) -> Result<Option<LaunchMode>>;
    fn set_launch_mode(&self, mode: LaunchMode) -> Result<()>;

    /// `saved_path` + `saved_expires` — the last destination the
    /// configuration endpoint served.
    fn saved_destination(&self) -> Result<Option<Destination>>;
    fn save_destination(&self, dest: &Destination) -> Result<()>;

    /// `allowed_alerts` / `denied_alerts` / `last_alert_prompt`.
    fn consent(&self) -> Result<ConsentState>;
    /// Record a grant/deny decision. The two flags stay mutually
    /// exclusive: recording one clears the other.
    fn record_consent(&self, granted: bool) -> Result<()>;
    /// Record when the consent prompt was last shown.
    fn record_prompt(&self, at: i64) -> Result<()>;

    /// `hasLaunchedBefore` — set once the first terminal routing decision
    /// is reached. Written but never read back for gating.
    fn has_launched_before(&self) -> Result<bool>;
    fn mark_launched(&self) -> Result<()>;

    /// `push_token` — the most recent messaging-service token.
    fn push_token(&self) -> Result<Option<String>>;
    fn set_push_token(&self, token: &str) -> Result<()>;

    /// `temp_path` — one-shot deep link cached from a push payload.
    fn pending_link(&self) -> Result<Option<String>>;
    fn set_pending_link(&self, url: &str) -> Result<()>;
    /// Consume the pending link, clearing it.
    fn take_pending_link(&self) -> Result<Option<String>>;

    /// Remove every persisted key.
    fn clear(&self) -> Result<()>;

    /// Raw dump of the persisted keys, for inspection tooling.
    fn dump(&self) -> Result<Vec<(String, serde_json::Value)>>;
}

/// Shared typed accessors over the underlying JSON map, so the file-backed
/// store and the in-memory fake stay behaviorally identical.
pub(crate) mod kv {
    use super::keys;
    use coopgate_core::{ConsentState, Destination, LaunchMode};
    use serde_json::{json, Map, Value};

    pub fn launch_mode(map: &Map<String, Value>) -> Option<LaunchMode> {
        map.get(keys::LAUNCH_MODE)
            .and_then(Value::as_str)
            .and_then(LaunchMode::parse)
    }

    pub fn set_launch_mode(map: &mut Map<String, Value>, mode: LaunchMode) {
        map.insert(keys::LAUNCH_MODE.into(), json!(mode.as_str()));
    }

    pub fn saved_destination(map: &Map<String, Value>) -> Option<Destination> {
        let url = map.get(keys::SAVED_PATH)?.as_str()?.to_string();
        let expires_at = map
            .get(keys::SAVED_EXPIRES)
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Some(Destination { url, expires_at })
    }

    pub fn save_destination(map: &mut Map<String, Value>, dest: &Destination) {
        map.insert(keys::SAVED_PATH.into(), json!(dest.url));
        map.insert(keys::SAVED_EXPIRES.into(), json!(dest.expires_at));
    }

    pub fn consent(map: &Map<String, Value>) -> ConsentState {
        ConsentState {
            granted: map
                .get(keys::ALLOWED_ALERTS)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            denied: map
                .get(keys::DENIED_ALERTS)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            last_prompt_at: map.get(keys::LAST_ALERT_PROMPT).and_then(Value::as_i64),
        }
    }

    pub fn record_consent(map: &mut Map<String, Value>, granted: bool) {
        map.insert(keys::ALLOWED_ALERTS.into(), json!(granted));
        map.insert(keys::DENIED_ALERTS.into(), json!(!granted));
    }

    pub fn record_prompt(map: &mut Map<String, Value>, at: i64) {
        map.insert(keys::LAST_ALERT_PROMPT.into(), json!(at));
    }

    pub fn has_launched_before(map: &Map<String, Value>) -> bool {
        map.get(keys::HAS_LAUNCHED_BEFORE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn mark_launched(map: &mut Map<String, Value>) {
        map.insert(keys::HAS_LAUNCHED_BEFORE.into(), json!(true));
    }

    pub fn push_token(map: &Map<String, Value>) -> Option<String> {
        map.get(keys::PUSH_TOKEN)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_push_token(map: &mut Map<String, Value>, token: &str) {
        map.insert(keys::PUSH_TOKEN.into(), json!(token));
    }

    pub fn pending_link(map: &Map<String, Value>) -> Option<String> {
        map.get(keys::PENDING_LINK)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_pending_link(map: &mut Map<String, Value>, url: &str) {
        map.insert(keys::PENDING_LINK.into(), json!(url));
    }

    pub fn take_pending_link(map: &mut Map<String, Value>) -> Option<String> {
        map.remove(keys::PENDING_LINK)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn dump(map: &Map<String, Value>) -> Vec<(String, Value)> {
        keys::ALL
            .iter()
            .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }
}
