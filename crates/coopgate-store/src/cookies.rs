//! Session-cookie persistence
//!
//! Cookies from remote-content responses are kept keyed by (domain, name)
//! and flushed to `cookies.json` next to the state file. Persistence is
//! best-effort: a failed flush is logged and the in-memory jar stays
//! authoritative for the session.

use coopgate_core::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const COOKIE_FILE: &str = "cookies.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub domain: String,
    pub name: String,
    pub value: String,
}

pub struct CookieStore {
    path: Option<PathBuf>,
    jar: DashMap<(String, String), String>,
}

impl CookieStore {
    /// Open the jar under `dir`, loading any previously persisted cookies.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(COOKIE_FILE);
        let jar = DashMap::new();
        if let Ok(content) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<Vec<CookieRecord>>(&content) {
                Ok(records) => {
                    for r in records {
                        jar.insert((r.domain, r.name), r.value);
                    }
                }
                Err(e) => warn!("Unreadable cookies at {}: {}", path.display(), e),
            }
        }
        Ok(Self {
            path: Some(path),
            jar,
        })
    }

    /// A jar that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            jar: DashMap::new(),
        }
    }

    pub fn set(&self, domain: &str, name: &str, value: &str) {
        self.jar
            .insert((domain.to_string(), name.to_string()), value.to_string());
        self.flush();
    }

    pub fn get(&self, domain: &str, name: &str) -> Option<String> {
        self.jar
            .get(&(domain.to_string(), name.to_string()))
            .map(|v| v.clone())
    }

    /// Cookie header value for a request to `domain`, or None if the jar
    /// holds nothing for it.
    pub fn header_for(&self, domain: &str) -> Option<String> {
        let mut pairs: Vec<String> = self
            .jar
            .iter()
            .filter(|e| e.key().0 == domain)
            .map(|e| format!("{}={}", e.key().1, e.value()))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        Some(pairs.join("; "))
    }

    pub fn len(&self) -> usize {
        self.jar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }

    fn records(&self) -> Vec<CookieRecord> {
        let mut out: Vec<CookieRecord> = self
            .jar
            .iter()
            .map(|e| CookieRecord {
                domain: e.key().0.clone(),
                name: e.key().1.clone(),
                value: e.value().clone(),
            })
            .collect();
        out.sort_by(|a, b| (&a.domain, &a.name).cmp(&(&b.domain, &b.name)));
        out
    }

    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let records = self.records();
        match serde_json::to_string_pretty(&records) {
            Ok(content) => {
                if let Err(e) = std::fs::write(path, content) {
                    warn!("Failed to persist cookies to {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Failed to encode cookies: {}", e),
        }
    }
}

/// Parse the name/value pair out of a `Set-Cookie` header, dropping
/// attributes like Path and Expires.
pub fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let first = header.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
