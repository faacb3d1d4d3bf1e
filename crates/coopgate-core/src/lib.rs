//! Coopgate Core - Types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::ShellConfig;
pub use error::{Error, Result};
pub use types::*;
