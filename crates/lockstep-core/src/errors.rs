//! Error types for the harness.
//!
//! Test-level failures are never errors: they are recorded as failed assertions.
//! `HarnessError` covers misuse of the harness itself and its I/O boundaries.

use crate::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration could not be read or is invalid.
    #[error("config error: {message}")]
    Config { message: String },

    /// `block` was called while another suspension is still outstanding.
    #[error("queue is already suspended by token #{active}")]
    AlreadySuspended { active: u64 },

    /// `unblock` was called with a token the harness no longer tracks
    /// (typically consumed by the timeout).
    #[error("suspension token #{token} is no longer active")]
    StaleSuspension { token: u64 },

    /// The virtual timer queue kept producing work past the configured limit.
    #[error(
        "timer queue exceeded max steps (possible self-rescheduling timer): limit={limit}, now_ms={now_ms}, pending={pending}"
    )]
    TimerStepLimit {
        limit: usize,
        now_ms: u64,
        pending: usize,
    },

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl HarnessError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
