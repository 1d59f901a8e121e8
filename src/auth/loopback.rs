use async_trait::async_trait;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, warn};

use crate::auth::{
    error::{AuthError, Result},
    types::{ExternalResult, PendingIntent},
};

const RESPONSE_BODY: &str = "<html><body><h3>You can return to the terminal.</h3></body></html>";

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    /// Returns `None` for requests that carry neither a code nor an error.
    pub fn into_result(self) -> Option<ExternalResult> {
        match (self.code, self.error) {
            (_, Some(error)) if error == "access_denied" => Some(ExternalResult::Cancelled),
            (_, Some(error)) => Some(ExternalResult::Error(error)),
            (Some(code), None) => Some(ExternalResult::Authorized {
                code,
                state: self.state.unwrap_or_default(),
            }),
            (None, None) => None,
        }
    }
}

async fn callback(
    State(tx): State<flume::Sender<ExternalResult>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match params.into_result() {
        Some(result) => {
            let _ = tx.try_send(result);
            Html(RESPONSE_BODY).into_response()
        }
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Receives the provider redirect on the loopback address of the pending
/// intent and turns it into an [`ExternalResult`].
pub struct LoopbackReceiver {
    listener: TcpListener,
}

impl LoopbackReceiver {
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri).map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;
        let host = url.host_str().unwrap_or("127.0.0.1").to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;
        debug!(host = host.as_str(), port, "loopback_listening");

        Ok(Self { listener })
    }

    pub fn local_port(&self) -> Option<u16> {
        self.listener.local_addr().ok().map(|addr| addr.port())
    }

    /// Serves `GET /` until the first redirect that carries a result.
    /// Every connection is handled on its own task, so idle or unrelated
    /// browser connections do not hold up the redirect.
    pub async fn wait(self) -> ExternalResult {
        let (tx, rx) = flume::bounded(1);
        let app = Router::new().route("/", get(callback)).with_state(tx);

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(self.listener, app).await {
                error!(error = %e, "loopback_server_failed");
            }
        });

        let result = rx
            .recv_async()
            .await
            .unwrap_or_else(|_| ExternalResult::Error("Sign-in redirect listener stopped".to_string()));
        server.abort();
        result
    }
}

/// Hands a [`PendingIntent`] to the user and waits for its outcome.
#[async_trait]
pub trait SignInLauncher: Send + Sync {
    async fn launch(&self, intent: &PendingIntent) -> ExternalResult;
}

/// The user opens the authorization URL in a browser; the redirect lands on
/// a [`LoopbackReceiver`] bound to the intent's redirect URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackLauncher;

#[async_trait]
impl SignInLauncher for LoopbackLauncher {
    async fn launch(&self, intent: &PendingIntent) -> ExternalResult {
        match LoopbackReceiver::bind(&intent.redirect_uri).await {
            Ok(receiver) => receiver.wait().await,
            Err(e) => {
                warn!(error = %e, "loopback_bind_failed");
                ExternalResult::Error(e.to_string())
            }
        }
    }
}
