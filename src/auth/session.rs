use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tracing::{info, instrument, warn};

use crate::auth::{
    error::{AuthError, Result},
    provider::IdentityProvider,
    store::SessionStore,
    types::{ExternalResult, PendingIntent, SignInResult, UserData},
};

/// Owns the signed-in user.
///
/// Every failure of [`AuthSession::complete_sign_in`] is folded into the
/// returned [`SignInResult`]; nothing is retried, the user starts over.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    user: ArcSwapOption<UserData>,
    pending: Mutex<Option<PendingIntent>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        let user = match store.load() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "session_restore_failed");
                None
            }
        };
        if let Some(user) = &user {
            info!(user_id = user.user_id.as_str(), "session_restored");
        }

        Self {
            provider,
            store,
            user: ArcSwapOption::new(user.map(Arc::new)),
            pending: Mutex::new(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<PendingIntent> {
        let pending = self.provider.begin_sign_in().await.map_err(|e| {
            warn!(error = %e, "sign_in_begin_failed");
            match e {
                AuthError::ProviderUnavailable(_) => e,
                other => AuthError::ProviderUnavailable(other.to_string()),
            }
        })?;

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(pending.clone());
        info!("sign_in_flow_started");
        Ok(pending)
    }

    #[instrument(skip(self, external))]
    pub async fn complete_sign_in(&self, external: ExternalResult) -> SignInResult {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(pending) = pending else {
            return SignInResult::failure(AuthError::NoSignInInProgress.to_string());
        };

        let code = match external {
            ExternalResult::Authorized { code, state } if state == pending.state => code,
            ExternalResult::Authorized { .. } => {
                warn!("sign_in_state_mismatch");
                return SignInResult::failure(AuthError::InvalidState.to_string());
            }
            ExternalResult::Cancelled => {
                info!("sign_in_cancelled");
                return SignInResult::failure(
                    AuthError::SignInCancelledOrFailed("cancelled by user".into()).to_string(),
                );
            }
            ExternalResult::Error(message) => {
                warn!(message = message.as_str(), "sign_in_provider_error");
                return SignInResult::failure(AuthError::SignInCancelledOrFailed(message).to_string());
            }
        };

        match self.provider.exchange_code(&pending, &code).await {
            Ok(user) => {
                if let Err(e) = self.store.save(&user) {
                    warn!(error = %e, "session_persist_failed");
                }
                info!(user_id = user.user_id.as_str(), "sign_in_completed");
                self.user.store(Some(Arc::new(user.clone())));
                SignInResult::success(user)
            }
            Err(e) => {
                warn!(error = %e, "sign_in_exchange_failed");
                SignInResult::failure(e.to_string())
            }
        }
    }

    /// Safe to call when already signed out.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider_sign_out_failed");
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "session_clear_failed");
        }
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if self.user.swap(None).is_some() {
            info!("signed_out");
        }
    }

    pub fn current_user(&self) -> Option<UserData> {
        self.user.load_full().map(|user| (*user).clone())
    }

    pub fn update_profile_picture(&self, url: &str) {
        let Some(user) = self.current_user() else {
            return;
        };
        let user = UserData {
            profile_picture_url: Some(url.to_string()),
            ..user
        };
        if let Err(e) = self.store.save(&user) {
            warn!(error = %e, "session_persist_failed");
        }
        self.user.store(Some(Arc::new(user)));
    }
}
