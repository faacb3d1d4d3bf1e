//! Attribution listener seam
//!
//! The install-attribution SDK is an external collaborator: it fires
//! exactly once per process start, either with a key-value payload or with
//! nothing. The router treats nothing as an empty payload and proceeds.

use coopgate_core::AttributionPayload;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

#[async_trait::async_trait]
pub trait AttributionSource: Send + Sync {
    /// Resolve the one-shot attribution signal. `None` means the SDK
    /// reported failure.
    async fn resolve(&self) -> Option<AttributionPayload>;
}

/// A fixed payload (or fixed failure), for wiring and tests.
pub struct StaticAttribution(Option<AttributionPayload>);

impl StaticAttribution {
    pub fn payload(payload: AttributionPayload) -> Self {
        Self(Some(payload))
    }

    pub fn empty() -> Self {
        Self(Some(AttributionPayload::new()))
    }

    pub fn failed() -> Self {
        Self(None)
    }
}

#[async_trait::async_trait]
impl AttributionSource for StaticAttribution {
    async fn resolve(&self) -> Option<AttributionPayload> {
        self.0.clone()
    }
}

/// Reads a JSON object of attribution keys from disk, the shape an SDK
/// sidecar would drop there. A missing or unreadable file is a failure.
pub struct FileAttribution {
    path: PathBuf,
}

impl FileAttribution {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl AttributionSource for FileAttribution {
    async fn resolve(&self) -> Option<AttributionPayload> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        let value: Value = serde_json::from_str(&content).ok()?;
        let object = value.as_object()?;
        let payload: AttributionPayload = object
            .iter()
            .filter_map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.clone(), v))
            })
            .collect();
        debug!("Attribution loaded from {}", self.path.display());
        Some(payload)
    }
}
