// src/error.rs
//! Error taxonomy for the sentiment pipeline.
//!
//! Blank user input is a silent no-op, not an error, so it has no variant
//! here; components return `Ok(None)` for it instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LensError {
    /// Network/HTTP failure from any external source.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Valid transport, invalid JSON or missing expected structure.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Required credential absent from config and environment.
    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),

    /// The LLM client is switched off by configuration.
    #[error("LLM client is disabled")]
    Disabled,

    /// Should-not-happen session state; logged and surfaced, never a crash.
    #[error("invalid session state: {0}")]
    State(&'static str),
}

impl From<reqwest::Error> for LensError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
