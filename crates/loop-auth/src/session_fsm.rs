//! Session state machine using rust-fsm.
//!
//! Tracks what this process believes about the actor's authentication. The
//! persisted [`loop_storage::ActorSession`] is the durable mirror; this
//! machine only decides which transitions are legal.
//!
//! ## State Diagram
//!
//! ```text
//!                 ┌─────────────┐
//!                 │   Unknown   │ (initial)
//!                 └──────┬──────┘
//!      RemoteVerified /  │  \ RemoteRejected / CacheMiss /
//!      SignInSucceeded   │    CredentialRejected
//!              ▼         │         ▼
//! ┌─────────────────┐    │    ┌─────────────────┐
//! │  Authenticated  │ ◄──┴──► │ Unauthenticated │
//! └─────────────────┘         └─────────────────┘
//!   RemoteRejected / SignedOut / CredentialRejected ──► Unauthenticated
//!   RemoteVerified / SignInSucceeded                ──► Authenticated
//! ```
//!
//! Only a remote confirmation or a successful sign-in leads into
//! `Authenticated`. No state is terminal.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unknown)

    Unknown => {
        RemoteVerified => Authenticated,
        RemoteRejected => Unauthenticated,
        CacheMiss => Unauthenticated,
        SignInSucceeded => Authenticated,
        CredentialRejected => Unauthenticated,
        SignedOut => Unauthenticated
    },
    Unauthenticated => {
        RemoteVerified => Authenticated,
        RemoteRejected => Unauthenticated,
        CacheMiss => Unauthenticated,
        SignInSucceeded => Authenticated,
        CredentialRejected => Unauthenticated,
        SignedOut => Unauthenticated
    },
    Authenticated => {
        RemoteVerified => Authenticated,
        RemoteRejected => Unauthenticated,
        SignInSucceeded => Authenticated,
        CredentialRejected => Unauthenticated,
        SignedOut => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption (CLI status, callbacks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has been checked yet in this process.
    Unknown,
    Unauthenticated,
    Authenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unknown => SessionState::Unknown,
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::Authenticated => SessionState::Authenticated,
        }
    }
}

/// Payload for session state change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateChanged {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChanged) + Send + Sync>;

/// Configuration for retry behavior during token refresh.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Maximum number of attempts.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RefreshConfig {
    /// Delay before retrying after the given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay_ms = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}
