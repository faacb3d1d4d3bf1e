//! Consent-prompt flow
//!
//! The shell asks for notification permission at most once per cooldown
//! window, and never again once the user has decided either way.

use coopgate_core::ConsentState;

/// Minimum seconds between consent prompts (3 days).
pub const REPROMPT_COOLDOWN_SECS: i64 = 259_200;

/// Whether the consent prompt should be shown now.
pub fn should_prompt(consent: &ConsentState, now: i64) -> bool {
    if consent.decided() {
        return false;
    }
    match consent.last_prompt_at {
        None => true,
        Some(at) => now - at >= REPROMPT_COOLDOWN_SECS,
    }
}

/// How the user resolved the prompt. Acceptance carries the system
/// permission request's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsentOutcome {
    PermissionGranted,
    PermissionDenied,
    /// The pre-permission prompt itself was declined; no system request
    /// was made.
    Declined,
}

/// External collaborator that shows the prompt and, on acceptance, drives
/// the system permission request.
#[async_trait::async_trait]
pub trait ConsentDelegate: Send + Sync {
    async fn request(&self) -> ConsentOutcome;
}
