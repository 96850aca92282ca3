//! Access tokens for API calls, refreshed on demand.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Supplies a bearer token that is valid for the next request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Token holder that refreshes through the flow manager once the access
/// token enters the expiry buffer.
pub struct TokenSource {
    flow: Arc<OAuthFlowManager>,
    tokens: Mutex<OAuthTokens>,
}

impl TokenSource {
    pub fn new(flow: Arc<OAuthFlowManager>, tokens: OAuthTokens) -> Self {
        Self {
            flow,
            tokens: Mutex::new(tokens),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for TokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut tokens = self.tokens.lock().await;

        if !tokens.is_expired() {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;

        debug!("Access token near expiry, refreshing");
        *tokens = self.flow.refresh_access_token(&refresh_token).await?;
        Ok(tokens.access_token.clone())
    }
}

/// Fixed token, for tests and pre-issued credentials.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
