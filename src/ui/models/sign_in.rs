use std::sync::Arc;

use tracing::info;

use crate::{
    auth::{
        AuthSession, PendingIntent, SignInPhase, SignInResult, SignInState, SignInStateMachine,
        loopback::SignInLauncher,
    },
    state::Observable,
    util::task::TaskManager,
};

const SIGN_IN_TASK: &str = "sign_in";

/// Drives one sign-in attempt at a time: begin the flow, hand the pending
/// intent to the launcher, then feed the outcome into the state machine.
pub struct SignInViewModel {
    session: Arc<AuthSession>,
    launcher: Arc<dyn SignInLauncher>,
    machine: SignInStateMachine,
    pending: Observable<Option<PendingIntent>>,
    tasks: TaskManager,
}

impl SignInViewModel {
    pub fn new(session: Arc<AuthSession>, launcher: Arc<dyn SignInLauncher>) -> Self {
        Self {
            session,
            launcher,
            machine: SignInStateMachine::new(),
            pending: Observable::default(),
            tasks: TaskManager::new(),
        }
    }

    pub fn state(&self) -> Observable<SignInState> {
        self.machine.state()
    }

    /// The intent the user still has to complete in the browser.
    pub fn pending(&self) -> Observable<Option<PendingIntent>> {
        self.pending.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.current_user().is_some()
    }

    pub fn sign_in(&mut self) {
        if self.machine.current().phase == SignInPhase::Pending {
            return;
        }
        self.machine.on_sign_in_started();

        let session = self.session.clone();
        let launcher = self.launcher.clone();
        let machine = self.machine.clone();
        let pending = self.pending.clone();
        self.tasks.spawn(
            SIGN_IN_TASK,
            tokio::spawn(async move {
                let result = match session.sign_in().await {
                    Ok(intent) => {
                        pending.set(Some(intent.clone()));
                        let external = launcher.launch(&intent).await;
                        pending.set(None);
                        session.complete_sign_in(external).await
                    }
                    Err(e) => SignInResult::failure(e.to_string()),
                };
                machine.on_sign_in_result(&result);
            }),
        );
    }

    /// Abandons a pending attempt. The machine lands in `Failed` so the user
    /// can retry, unless the attempt already signed the session in.
    pub async fn cancel(&mut self) {
        if self.machine.current().phase != SignInPhase::Pending {
            return;
        }
        self.tasks.abort(SIGN_IN_TASK).await;
        self.pending.set(None);
        if self.machine.current().phase != SignInPhase::Pending {
            return;
        }

        match self.session.current_user() {
            Some(user) => {
                info!(user_id = user.user_id.as_str(), "sign_in_cancel_too_late");
                self.machine.on_sign_in_result(&SignInResult::success(user));
            }
            None => {
                self.machine
                    .on_sign_in_result(&SignInResult::failure("Sign-in cancelled"));
                info!("sign_in_cancelled");
            }
        }
    }

    /// True once per successful attempt.
    pub fn take_success(&self) -> bool {
        self.machine.take_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        ExternalResult,
        session::tests::FakeProvider,
        store::MemorySessionStore,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    struct FakeLauncher(ExternalResult);

    #[async_trait]
    impl SignInLauncher for FakeLauncher {
        async fn launch(&self, _intent: &PendingIntent) -> ExternalResult {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.clone()
        }
    }

    /// Never returns, like a user who never finishes in the browser.
    struct StalledLauncher;

    #[async_trait]
    impl SignInLauncher for StalledLauncher {
        async fn launch(&self, _intent: &PendingIntent) -> ExternalResult {
            std::future::pending().await
        }
    }

    fn view_model(provider: FakeProvider, launcher: impl SignInLauncher + 'static) -> SignInViewModel {
        let session = Arc::new(AuthSession::new(
            Arc::new(provider),
            Arc::new(MemorySessionStore::default()),
        ));
        SignInViewModel::new(session, Arc::new(launcher))
    }

    async fn wait_until_settled(vm: &SignInViewModel) -> SignInState {
        let mut rx = vm.state().subscribe();
        let state = rx
            .wait_for(|s| s.phase != SignInPhase::Pending)
            .await
            .unwrap()
            .clone();
        state
    }

    #[tokio::test(start_paused = true)]
    async fn success_navigates_exactly_once() {
        let mut vm = view_model(
            FakeProvider::default(),
            FakeLauncher(ExternalResult::Authorized {
                code: "code".to_string(),
                state: "state-1".to_string(),
            }),
        );
        assert_eq!(vm.state().get().phase, SignInPhase::Idle);

        vm.sign_in();
        assert_eq!(vm.state().get().phase, SignInPhase::Pending);

        let settled = wait_until_settled(&vm).await;
        assert_eq!(settled.phase, SignInPhase::Succeeded);
        assert!(settled.is_sign_in_successful);
        assert!(vm.is_signed_in());
        assert!(vm.pending().get().is_none());

        let navigations = (0..5).filter(|_| vm.take_success()).count();
        assert_eq!(navigations, 1);
        assert_eq!(vm.state().get(), SignInState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_flow_fails_and_can_be_retried() {
        let mut vm = view_model(FakeProvider::default(), FakeLauncher(ExternalResult::Cancelled));

        vm.sign_in();
        let settled = wait_until_settled(&vm).await;
        assert_eq!(settled.phase, SignInPhase::Failed);
        assert!(settled.sign_in_error.is_some());
        assert!(!vm.take_success());

        vm.sign_in();
        assert_eq!(vm.state().get().phase, SignInPhase::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_provider_reports_failure() {
        let provider = FakeProvider {
            unavailable: true,
            ..FakeProvider::default()
        };
        let mut vm = view_model(provider, StalledLauncher);

        vm.sign_in();
        let settled = wait_until_settled(&vm).await;
        assert_eq!(settled.phase, SignInPhase::Failed);
        assert!(!vm.is_signed_in());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_pending_attempt() {
        let mut vm = view_model(FakeProvider::default(), StalledLauncher);

        vm.sign_in();
        let mut pending = vm.pending().subscribe();
        pending.wait_for(|p| p.is_some()).await.unwrap();

        vm.cancel().await;
        assert!(vm.pending().get().is_none());
        let state = vm.state().get();
        assert_eq!(state.phase, SignInPhase::Failed);
        assert_eq!(state.sign_in_error.as_deref(), Some("Sign-in cancelled"));
        assert!(!vm.is_signed_in());

        vm.cancel().await;
        assert_eq!(vm.state().get().phase, SignInPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_session_signed_in_reports_success() {
        let mut vm = view_model(FakeProvider::default(), StalledLauncher);

        vm.sign_in();
        vm.pending().subscribe().wait_for(|p| p.is_some()).await.unwrap();
        let completed = vm
            .session
            .complete_sign_in(ExternalResult::Authorized {
                code: "code".to_string(),
                state: "state-1".to_string(),
            })
            .await;
        assert!(completed.data.is_some());

        vm.cancel().await;

        let state = vm.state().get();
        assert_eq!(state.phase, SignInPhase::Succeeded);
        assert_eq!(state.sign_in_error, None);
        assert!(vm.take_success());
    }
}
