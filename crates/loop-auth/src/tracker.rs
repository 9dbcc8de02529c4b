//! Shared owner of the session state machine.

use crate::session_fsm::{
    SessionMachine, SessionMachineInput, SessionState, SessionStateCallback, SessionStateChanged,
};
use crate::{AuthError, AuthResult};
use std::sync::Mutex;
use tracing::debug;

/// Holds the session FSM and the optional change callback.
///
/// One tracker is shared by the guard and the authenticator so both drive
/// the same machine.
pub struct SessionTracker {
    fsm: Mutex<SessionMachine>,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            fsm: Mutex::new(SessionMachine::new()),
            state_callback: Mutex::new(None),
        }
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        let mut cb = self
            .state_callback
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        *cb = Some(callback);
    }

    pub fn state(&self) -> SessionState {
        let fsm = self.fsm.lock().unwrap_or_else(|p| p.into_inner());
        SessionState::from(fsm.state())
    }

    /// Apply `input` and notify the callback if the state changed.
    pub fn transition(
        &self,
        input: &SessionMachineInput,
        user_id: Option<&str>,
    ) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock().unwrap_or_else(|p| p.into_inner());
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            self.notify(new_state, user_id);
        }

        Ok(new_state)
    }

    fn notify(&self, state: SessionState, user_id: Option<&str>) {
        let cb = self
            .state_callback
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        if let Some(callback) = cb.as_ref() {
            callback(SessionStateChanged {
                state,
                user_id: user_id.map(str::to_string),
            });
        }
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
