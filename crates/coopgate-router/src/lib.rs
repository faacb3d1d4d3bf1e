//! Coopgate Router - the launch-routing state machine

pub mod consent;
pub mod router;

pub use consent::{should_prompt, ConsentDelegate, ConsentOutcome, REPROMPT_COOLDOWN_SECS};
pub use router::{LaunchRouter, RouterEvent, RouterHandle};
