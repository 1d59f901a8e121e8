use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        error::{AuthError, Result},
        provider::IdentityProvider,
        types::{PendingIntent, UserData},
    },
    config::GoogleConfig,
};

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const SCOPES: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct Discovery {
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    #[serde(default)]
    revocation_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for UserData {
    fn from(info: UserInfo) -> Self {
        Self {
            user_id: info.sub,
            username: info.name,
            profile_picture_url: info.picture,
        }
    }
}

/// Google OAuth 2.0 authorization-code flow for an installed app.
///
/// The consent page redirects to a loopback address, see
/// [`crate::auth::loopback::LoopbackReceiver`].
pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    discovery: ArcSwapOption<Discovery>,
    access_token: ArcSwapOption<String>,
}

impl GoogleIdentityProvider {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: format!("http://127.0.0.1:{}/", config.redirect_port),
            discovery: ArcSwapOption::empty(),
            access_token: ArcSwapOption::empty(),
        }
    }

    async fn discovery(&self) -> Result<Arc<Discovery>> {
        if let Some(discovery) = self.discovery.load_full() {
            return Ok(discovery);
        }

        let discovery: Discovery = self
            .http
            .get(DISCOVERY_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        let discovery = Arc::new(discovery);
        self.discovery.store(Some(discovery.clone()));
        Ok(discovery)
    }
}

/// PKCE code verifier plus the CSRF state of one authorization request.
pub(crate) struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    pub fn new() -> Self {
        let mut rng = rand::rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// `BASE64URL(SHA256(verifier))`, the S256 method.
    pub fn challenge(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.verifier.as_bytes()))
    }
}

pub(crate) fn authorization_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    pkce: &PkceVerifier,
) -> Result<String> {
    let mut url = Url::parse(endpoint).map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPES)
        .append_pair("state", pkce.state())
        .append_pair("code_challenge", &pkce.challenge())
        .append_pair("code_challenge_method", "S256")
        .append_pair("prompt", "select_account");
    Ok(url.to_string())
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    #[instrument(skip(self))]
    async fn begin_sign_in(&self) -> Result<PendingIntent> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::ProviderUnavailable("GOOGLE_CLIENT_ID is not set".into()))?;

        let discovery = self.discovery().await?;
        let pkce = PkceVerifier::new();
        let authorization_url = authorization_url(
            &discovery.authorization_endpoint,
            client_id,
            &self.redirect_uri,
            &pkce,
        )?;

        debug!("google_sign_in_url_built");
        Ok(PendingIntent {
            authorization_url,
            state: pkce.state().to_string(),
            redirect_uri: self.redirect_uri.clone(),
            code_verifier: pkce.verifier().to_string(),
        })
    }

    #[instrument(skip(self, pending, code))]
    async fn exchange_code(&self, pending: &PendingIntent, code: &str) -> Result<UserData> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::ProviderUnavailable("GOOGLE_CLIENT_ID is not set".into()))?;
        let discovery = self.discovery().await?;

        let mut form = vec![
            ("code", code),
            ("client_id", client_id),
            ("redirect_uri", pending.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", pending.code_verifier.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token: TokenResponse = self
            .http
            .post(&discovery.token_endpoint)
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        let info: UserInfo = self
            .http
            .get(&discovery.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        self.access_token.store(Some(Arc::new(token.access_token)));
        info!(user_id = info.sub.as_str(), "google_sign_in_exchanged");
        Ok(info.into())
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(token) = self.access_token.swap(None) else {
            return Ok(());
        };
        let Some(endpoint) = self
            .discovery
            .load_full()
            .and_then(|d| d.revocation_endpoint.clone())
        else {
            return Ok(());
        };

        if let Err(e) = self
            .http
            .post(endpoint)
            .form(&[("token", token.as_str())])
            .send()
            .await
        {
            warn!(error = %e, "google_token_revoke_failed");
        }
        Ok(())
    }
}
