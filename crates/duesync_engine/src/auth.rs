use std::sync::Arc;

use duesync_logging::{ds_debug, ds_info, ds_warn};
use tokio::sync::Mutex;
use url::Url;

use crate::transport::{ApiRequest, ApiTransport};

pub const DEFAULT_REVOKE_URL: &str = "https://accounts.google.com/o/oauth2/revoke";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The identity provider refused or failed; carries its message.
    #[error("{0}")]
    Denied(String),
    #[error("token cache error: {0}")]
    Cache(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn,
}

/// Host identity facility: hands out bearer tokens and keeps its own cache.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// With `interactive == false` only a cached token may be returned.
    async fn get_token(&self, interactive: bool) -> Result<String, AuthError>;

    async fn remove_cached_token(&self, token: &str) -> Result<(), AuthError>;
}

/// Owns the session's access token.
///
/// The token lives in a single mutex-guarded slot; every acquisition,
/// refresh and revoke holds the slot for its whole duration, so concurrent
/// callers queue instead of prompting twice.
pub struct AuthManager {
    provider: Arc<dyn IdentityProvider>,
    transport: Arc<dyn ApiTransport>,
    revoke_url: String,
    slot: Mutex<Option<String>>,
}

impl AuthManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        transport: Arc<dyn ApiTransport>,
        revoke_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            transport,
            revoke_url: revoke_url.into(),
            slot: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> AuthState {
        if self.slot.lock().await.is_some() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    pub async fn current_token(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    /// Returns the held token, else a silently available one, else (when
    /// `interactive`) prompts through the provider.
    pub async fn ensure_token(&self, interactive: bool) -> Result<String, AuthError> {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = match self.provider.get_token(false).await {
            Ok(token) => token,
            Err(err) if interactive => {
                ds_debug!("No cached token ({}); asking interactively", err);
                self.provider.get_token(true).await?
            }
            Err(err) => return Err(err),
        };
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Replaces a token the API rejected with a freshly authorized one.
    ///
    /// When the slot no longer holds `stale`, another caller has already
    /// refreshed and the current token is returned without prompting.
    pub async fn refresh(&self, stale: &str) -> Result<String, AuthError> {
        let mut slot = self.slot.lock().await;
        if let Some(current) = slot.as_deref() {
            if current != stale {
                return Ok(current.to_string());
            }
        }

        *slot = None;
        // A provider still holding `stale` would hand it straight back.
        if let Err(err) = self.provider.remove_cached_token(stale).await {
            ds_warn!("Failed to drop rejected token from cache: {}", err);
            return Err(err);
        }
        let token = self.provider.get_token(true).await?;
        ds_info!("Access token refreshed");
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Forgets `token` locally if it is still the held one.
    pub async fn invalidate(&self, token: &str) {
        let mut slot = self.slot.lock().await;
        if slot.as_deref() == Some(token) {
            *slot = None;
        }
    }

    /// Signs out: best-effort remote revoke, then the provider cache clear.
    ///
    /// The manager is `SignedOut` afterwards whatever the outcome; the error
    /// only reports a failed cache clear.
    pub async fn revoke(&self) -> Result<(), AuthError> {
        let mut slot = self.slot.lock().await;
        let token = match slot.take() {
            Some(token) => token,
            None => match self.provider.get_token(false).await {
                Ok(token) => token,
                Err(_) => return Ok(()),
            },
        };

        match self.revoke_request(&token) {
            Ok(request) => match self.transport.execute(&request, None).await {
                Ok(response) if response.is_success() => ds_info!("Token revoked remotely"),
                Ok(response) => ds_warn!("Token revoke returned status {}", response.status),
                Err(err) => ds_warn!("Token revoke failed: {}", err),
            },
            Err(err) => ds_warn!("Invalid revoke url {}: {}", self.revoke_url, err),
        }

        self.provider.remove_cached_token(&token).await
    }

    fn revoke_request(&self, token: &str) -> Result<ApiRequest, url::ParseError> {
        let mut url = Url::parse(&self.revoke_url)?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(ApiRequest::get(url.to_string()))
    }
}
