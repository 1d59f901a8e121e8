use std::sync::Mutex;

use tracing::debug;

use crate::auth::{
    error::{AuthError, Result},
    types::UserData,
};

const KEYRING_SERVICE: &str = "symphony";
const KEYRING_USER: &str = "signed-in-user";

/// Keeps the signed-in user across restarts.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<UserData>>;
    fn save(&self, user: &UserData) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub struct KeyringSessionStore {
    entry: keyring::Entry,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .map_err(|e| AuthError::SessionStore(e.to_string()))?;
        Ok(Self { entry })
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<UserData>> {
        match self.entry.get_password() {
            Ok(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AuthError::SessionStore(e.to_string())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::SessionStore(e.to_string())),
        }
    }

    fn save(&self, user: &UserData) -> Result<()> {
        let json = serde_json::to_string(user).map_err(|e| AuthError::SessionStore(e.to_string()))?;
        self.entry
            .set_password(&json)
            .map_err(|e| AuthError::SessionStore(e.to_string()))?;
        debug!(user_id = user.user_id.as_str(), "session_saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::SessionStore(e.to_string())),
        }
    }
}

/// Process-lifetime store, used when no OS keyring is reachable.
#[derive(Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<UserData>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<UserData>> {
        Ok(self
            .user
            .lock()
            .map_err(|e| AuthError::SessionStore(e.to_string()))?
            .clone())
    }

    fn save(&self, user: &UserData) -> Result<()> {
        *self
            .user
            .lock()
            .map_err(|e| AuthError::SessionStore(e.to_string()))? = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .user
            .lock()
            .map_err(|e| AuthError::SessionStore(e.to_string()))? = None;
        Ok(())
    }
}
