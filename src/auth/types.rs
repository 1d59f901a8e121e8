use serde::{Deserialize, Serialize};

/// The signed-in account as the rest of the app sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: String,
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
}

/// Outcome of one sign-in attempt. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub data: Option<UserData>,
    pub error_message: Option<String>,
}

impl SignInResult {
    pub fn success(user: UserData) -> Self {
        Self {
            data: Some(user),
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error_message: Some(message.into()),
        }
    }
}

/// What the UI needs to send the user through the provider's consent page.
///
/// `code_verifier` is the PKCE secret matching the challenge embedded in
/// `authorization_url`. It only ever leaves the process in the token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingIntent {
    pub authorization_url: String,
    pub state: String,
    pub redirect_uri: String,
    pub code_verifier: String,
}

impl std::fmt::Debug for PendingIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingIntent")
            .field("authorization_url", &self.authorization_url)
            .field("state", &self.state)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// The provider's answer as delivered back to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalResult {
    Authorized { code: String, state: String },
    Cancelled,
    Error(String),
}
