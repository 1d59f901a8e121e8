use async_trait::async_trait;

use crate::auth::{
    error::Result,
    types::{PendingIntent, UserData},
};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Prepares the interactive flow. Fails with `ProviderUnavailable` when the
    /// provider cannot be reached or is not configured.
    async fn begin_sign_in(&self) -> Result<PendingIntent>;

    /// Trades an authorization code for the account it belongs to.
    async fn exchange_code(&self, pending: &PendingIntent, code: &str) -> Result<UserData>;

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}
