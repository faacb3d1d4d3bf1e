//! Core types for Coopgate

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted launch preference. Read at process start, written once per
/// decision cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchMode {
    /// Prefer the local dashboard on subsequent launches.
    Nest,
    /// Prefer remote content on subsequent launches.
    StatsDisplay,
}

impl LaunchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::Nest => "Nest",
            LaunchMode::StatsDisplay => "StatsDisplay",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Nest" => Some(LaunchMode::Nest),
            "StatsDisplay" => Some(LaunchMode::StatsDisplay),
            _ => None,
        }
    }
}

impl std::fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL the content surface should load, with the expiry the
/// configuration endpoint attached to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub url: String,
    pub expires_at: i64,
}

impl Destination {
    /// Build a destination, rejecting anything that does not parse as an
    /// absolute URL.
    pub fn parse(url: impl Into<String>, expires_at: i64) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url).map_err(|e| Error::InvalidDestination(format!("{}: {}", url, e)))?;
        Ok(Self { url, expires_at })
    }
}

/// The router's current top-level display state. Exactly one is active;
/// transitions are one-directional within a launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayPhase {
    /// Initial state, splash shown.
    Hatching,
    /// Remote content presented by the content surface.
    StatsDisplay(Destination),
    /// Local dashboard only, terminal for the session.
    NestFallback,
    /// Full-screen no-connectivity notice.
    StrayOffline,
}

impl DisplayPhase {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayPhase::Hatching => "hatching",
            DisplayPhase::StatsDisplay(_) => "statsDisplay",
            DisplayPhase::NestFallback => "nestFallback",
            DisplayPhase::StrayOffline => "strayOffline",
        }
    }

    /// A terminal phase ends the routing sequence for this launch.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DisplayPhase::StatsDisplay(_) | DisplayPhase::NestFallback
        )
    }
}

impl std::fmt::Display for DisplayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The user's notification-permission decision. `granted` and `denied`
/// are never both true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    pub granted: bool,
    pub denied: bool,
    pub last_prompt_at: Option<i64>,
}

impl ConsentState {
    /// Whether a grant/deny decision has been recorded.
    pub fn decided(&self) -> bool {
        self.granted || self.denied
    }
}

/// Install-provenance data, delivered at most once per process lifetime.
/// A delivery failure is represented as an empty payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionPayload(BTreeMap<String, String>);

impl AttributionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for AttributionPayload {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_mode_round_trips_persisted_strings() {
        assert_eq!(LaunchMode::parse("Nest"), Some(LaunchMode::Nest));
        assert_eq!(
            LaunchMode::parse("StatsDisplay"),
            Some(LaunchMode::StatsDisplay)
        );
        assert_eq!(LaunchMode::parse("Coop"), None);
        assert_eq!(LaunchMode::StatsDisplay.as_str(), "StatsDisplay");
    }

    #[test]
    fn destination_rejects_relative_urls() {
        assert!(Destination::parse("https://x.test/a", 9_999_999_999).is_ok());
        assert!(Destination::parse("not a url", 0).is_err());
        assert!(Destination::parse("/relative/path", 0).is_err());
    }

    #[test]
    fn phase_terminality() {
        let dest = Destination::parse("https://x.test/a", 1).unwrap();
        assert!(DisplayPhase::StatsDisplay(dest).is_terminal());
        assert!(DisplayPhase::NestFallback.is_terminal());
        assert!(!DisplayPhase::Hatching.is_terminal());
        assert!(!DisplayPhase::StrayOffline.is_terminal());
    }

    #[test]
    fn consent_decided_after_either_outcome() {
        let mut c = ConsentState::default();
        assert!(!c.decided());
        c.granted = true;
        assert!(c.decided());
    }
}
