//! Errors surfaced at the core boundary.
//!
//! Provider and binary code work in `anyhow`; anything crossing into the
//! pipeline or conversation layers is narrowed to [`Error`]. Review parsing
//! problems are never errors, see [`crate::review::ReviewResult::parse_error`].

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing agent/conversation settings. Detected at
    /// construction, fatal to the value being built.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model call failed or produced no content.
    #[error("agent '{agent}' invocation failed: {reason}")]
    AgentInvocation { agent: String, reason: String },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn invocation(agent: &str, reason: impl std::fmt::Display) -> Self {
        Error::AgentInvocation {
            agent: agent.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of the outbound model call.
    pub fn is_invocation(&self) -> bool {
        matches!(self, Error::AgentInvocation { .. })
    }
}
