//! Google sign-in: the identity provider adapter, the session that owns the
//! signed-in user, and the state machine the sign-in screen renders.

pub mod error;
pub mod google;
pub mod loopback;
pub mod provider;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use error::AuthError;
pub use session::AuthSession;
pub use state::{SignInPhase, SignInState, SignInStateMachine};
pub use types::{ExternalResult, PendingIntent, SignInResult, UserData};
