//! Push-payload ingestion
//!
//! Inbound push and cold-launch notification payloads are scanned for a
//! deep link (`url` at top level or nested under `data`). A hit is cached
//! as the one-shot pending link the router consumes on its next
//! evaluation.

use coopgate_core::Result;
use coopgate_store::StateStore;
use serde_json::Value;
use tracing::info;

/// Deep link carried by a push payload, if any.
pub fn extract_link(payload: &Value) -> Option<&str> {
    payload
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| {
            payload
                .get("data")
                .and_then(|d| d.get("url"))
                .and_then(Value::as_str)
        })
}

/// Cache the payload's deep link for the router. Returns whether a link
/// was found.
pub fn ingest(store: &dyn StateStore, payload: &Value) -> Result<bool> {
    match extract_link(payload) {
        Some(url) => {
            info!("Push payload carries deep link");
            store.set_pending_link(url)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
