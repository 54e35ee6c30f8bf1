use std::sync::Arc;

use duesync_logging::{ds_info, ds_warn};

use crate::auth::{AuthError, AuthManager};
use crate::transport::{ApiRequest, ApiResponse, ApiTransport, TransportError};

/// Retries allowed after the first attempt.
pub const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Sends API calls with a fixed one-shot retry policy.
///
/// - 401 with budget left: refresh the token interactively and resend.
/// - transport failure with budget left: resend, auth untouched.
/// - budget exhausted: the last response (even a 401) or the last error.
pub struct ResilientRequest {
    transport: Arc<dyn ApiTransport>,
    auth: Arc<AuthManager>,
    retries: u32,
}

impl ResilientRequest {
    pub fn new(transport: Arc<dyn ApiTransport>, auth: Arc<AuthManager>) -> Self {
        Self::with_retries(transport, auth, DEFAULT_RETRIES)
    }

    pub fn with_retries(
        transport: Arc<dyn ApiTransport>,
        auth: Arc<AuthManager>,
        retries: u32,
    ) -> Self {
        Self {
            transport,
            auth,
            retries,
        }
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, RequestError> {
        let mut retries_remaining = self.retries;
        let mut token = self.auth.ensure_token(false).await?;

        loop {
            match self.transport.execute(request, Some(&token)).await {
                Ok(response) if response.is_unauthorized() && retries_remaining > 0 => {
                    retries_remaining -= 1;
                    ds_info!("{} answered 401; refreshing token", request.url);
                    token = self.auth.refresh(&token).await?;
                }
                Ok(response) => {
                    if response.is_unauthorized() {
                        self.auth.invalidate(&token).await;
                    }
                    return Ok(response);
                }
                Err(err) if retries_remaining > 0 => {
                    retries_remaining -= 1;
                    ds_warn!("{} failed ({}); retrying", request.url, err);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
