//! Shell configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Remote configuration endpoint and fixed identifiers.
    pub endpoint: EndpointConfig,
    /// App identity sent with every configuration request.
    pub app: AppConfig,
    /// Reachability probe parameters.
    pub probe: ProbeConfig,
    /// Content-surface parameters.
    pub surface: SurfaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL the setup query is POSTed to.
    pub setup_url: String,
    /// Fixed store identifier included in every query.
    pub store_id: String,
    /// Messaging-service project id included in every query.
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bundle identifier reported to the endpoint.
    pub bundle_id: String,
    /// Preferred locale, e.g. "en-US". Defaults to the EN region when
    /// unset or unparseable.
    pub locale: Option<String>,
    /// Where persisted state lives. Defaults to `$HOME/.coopgate`.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Host the reachability probe connects to.
    pub host: String,
    /// Port the reachability probe connects to.
    pub port: u16,
    /// Poll interval in milliseconds.
    pub interval_ms: u64,
    /// Per-probe connect timeout in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Redirects followed before falling back to the last good path.
    pub redirect_cap: u32,
    /// Preview fetch timeout in milliseconds.
    pub fetch_timeout_ms: u64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            app: AppConfig::default(),
            probe: ProbeConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            setup_url: "https://config.coopgate.app/config.php".into(),
            store_id: "6744830127".into(),
            project_id: "coopgate-flock".into(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bundle_id: "app.coopgate.flock".into(),
            locale: None,
            data_dir: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "1.1.1.1".into(),
            port: 443,
            interval_ms: 2_000,
            timeout_ms: 1_500,
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            redirect_cap: 6,
            fetch_timeout_ms: 15_000,
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl ShellConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} — using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} — using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Resolved state directory: configured value or `$HOME/.coopgate`.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.app.data_dir {
            return dir.clone();
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".coopgate")
    }
}
