use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Sign-in cancelled or failed: {0}")]
    SignInCancelledOrFailed(String),

    #[error("No sign-in in progress")]
    NoSignInInProgress,

    #[error("State parameter mismatch")]
    InvalidState,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Session storage unavailable: {0}")]
    SessionStore(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
