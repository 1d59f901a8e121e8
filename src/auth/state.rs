use tracing::debug;

use crate::{auth::types::SignInResult, state::Observable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignInPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInState {
    pub phase: SignInPhase,
    pub is_sign_in_successful: bool,
    pub sign_in_error: Option<String>,
}

/// Sign-in screen state. A success is consumed once through
/// [`SignInStateMachine::take_success`], which puts the machine back to idle
/// so a redraw cannot navigate twice.
#[derive(Clone, Default)]
pub struct SignInStateMachine {
    state: Observable<SignInState>,
}

impl SignInStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Observable<SignInState> {
        self.state.clone()
    }

    pub fn current(&self) -> SignInState {
        self.state.get()
    }

    pub fn on_sign_in_started(&self) {
        self.state.set(SignInState {
            phase: SignInPhase::Pending,
            ..SignInState::default()
        });
    }

    pub fn on_sign_in_result(&self, result: &SignInResult) {
        let next = if result.data.is_some() {
            SignInState {
                phase: SignInPhase::Succeeded,
                is_sign_in_successful: true,
                sign_in_error: None,
            }
        } else {
            SignInState {
                phase: SignInPhase::Failed,
                is_sign_in_successful: false,
                sign_in_error: result.error_message.clone(),
            }
        };
        debug!(phase = ?next.phase, "sign_in_state_changed");
        self.state.set(next);
    }

    pub fn reset_state(&self) {
        self.state.set(SignInState::default());
    }

    pub fn take_success(&self) -> bool {
        let succeeded = self.state.with(|s| s.is_sign_in_successful);
        if succeeded {
            self.reset_state();
        }
        succeeded
    }
}
