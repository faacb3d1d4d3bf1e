//! Remote configuration client
//!
//! One POST per launch: the shell sends its identity and attribution data,
//! the endpoint answers with either a destination to display or a
//! rejection. Non-200 statuses and malformed bodies take the same fallback
//! path as transport failures. No request timeout is set beyond the
//! client's default, so a hung endpoint keeps the splash up.
//!
//! Wire response: `{ "ok": bool, "url": string?, "expires": number? }`

use coopgate_core::{AttributionPayload, Destination, ShellConfig};
use coopgate_store::cookies::{parse_set_cookie, CookieStore};
use coopgate_store::StateStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Platform tag the endpoint keys on; the shell reports itself as the
/// original client does.
const OS_TAG: &str = "iOS";

/// Fixed identifiers every setup query carries.
#[derive(Clone, Debug)]
pub struct QueryContext {
    pub install_id: String,
    pub bundle_id: String,
    pub store_id: String,
    pub project_id: String,
    pub locale: String,
}

impl QueryContext {
    pub fn from_config(config: &ShellConfig, install_id: impl Into<String>) -> Self {
        Self {
            install_id: install_id.into(),
            bundle_id: config.app.bundle_id.clone(),
            store_id: config.endpoint.store_id.clone(),
            project_id: config.endpoint.project_id.clone(),
            locale: locale_region(config.app.locale.as_deref()),
        }
    }
}

/// Body of the configuration POST. Attribution keys are flattened into the
/// top-level object alongside the fixed fields.
#[derive(Clone, Debug, Serialize)]
pub struct SetupQuery {
    #[serde(flatten)]
    pub attribution: AttributionPayload,
    pub install_id: String,
    pub bundle_id: String,
    pub os: &'static str,
    pub store_id: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    pub project_id: String,
}

impl SetupQuery {
    /// Assemble the query from the attribution payload, fixed identity,
    /// and the cached push token (a live token, when present in the store,
    /// wins over none).
    pub fn build(
        attribution: AttributionPayload,
        ctx: &QueryContext,
        store: &dyn StateStore,
    ) -> Self {
        let push_token = store.push_token().unwrap_or_else(|e| {
            warn!("Push token unreadable: {}", e);
            None
        });
        Self {
            attribution,
            install_id: ctx.install_id.clone(),
            bundle_id: ctx.bundle_id.clone(),
            os: OS_TAG,
            store_id: ctx.store_id.clone(),
            locale: ctx.locale.clone(),
            push_token,
            project_id: ctx.project_id.clone(),
        }
    }
}

/// Uppercased 2-letter region derived from a preferred-locale string,
/// defaulting to "EN".
pub fn locale_region(raw: Option<&str>) -> String {
    let lang = raw
        .unwrap_or("")
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .trim();
    if lang.len() == 2 && lang.chars().all(|c| c.is_ascii_alphabetic()) {
        lang.to_ascii_uppercase()
    } else {
        "EN".to_string()
    }
}

#[derive(Debug, Deserialize)]
struct SetupResponse {
    ok: bool,
    url: Option<String>,
    expires: Option<i64>,
}

/// What the endpoint decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupDecision {
    /// Serve the given destination and remember it.
    Serve(Destination),
    /// Serve the local dashboard.
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for SetupError {
    fn from(e: reqwest::Error) -> Self {
        SetupError::Transport(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait SetupService: Send + Sync {
    async fn submit(&self, query: &SetupQuery) -> Result<SetupDecision, SetupError>;
}

pub struct HttpSetupClient {
    client: reqwest::Client,
    endpoint: String,
    endpoint_host: String,
    cookies: Arc<CookieStore>,
}

impl HttpSetupClient {
    pub fn new(endpoint: impl Into<String>, cookies: Arc<CookieStore>) -> Self {
        let endpoint = endpoint.into();
        let endpoint_host = url::Url::parse(&endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            client: reqwest::Client::new(),
            endpoint,
            endpoint_host,
            cookies,
        }
    }
}

#[async_trait::async_trait]
impl SetupService for HttpSetupClient {
    async fn submit(&self, query: &SetupQuery) -> Result<SetupDecision, SetupError> {
        debug!("Setup query: install_id={}", query.install_id);

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(query)
            .send()
            .await?;

        for header in response.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Some((name, value)) = header.to_str().ok().and_then(parse_set_cookie) {
                self.cookies.set(&self.endpoint_host, &name, &value);
            }
        }

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        decode(status, &body)
    }
}

/// Turn a raw (status, body) pair into a decision. Split from the client
/// so the response handling is testable without a live endpoint.
pub fn decode(status: u16, body: &[u8]) -> Result<SetupDecision, SetupError> {
    if status != 200 {
        return Err(SetupError::Protocol(format!("status {}", status)));
    }
    let response: SetupResponse = serde_json::from_slice(body)
        .map_err(|e| SetupError::Protocol(format!("malformed body: {}", e)))?;
    if !response.ok {
        return Ok(SetupDecision::Reject);
    }
    match (response.url, response.expires) {
        (Some(url), Some(expires)) => {
            let dest = Destination::parse(url, expires)
                .map_err(|e| SetupError::Protocol(e.to_string()))?;
            Ok(SetupDecision::Serve(dest))
        }
        _ => Err(SetupError::Protocol("ok without url/expires".into())),
    }
}
