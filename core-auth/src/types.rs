use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth 2.0 token set.
///
/// Contains the access token, the optional refresh token, and the expiration
/// time for an authenticated session.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
/// use chrono::{Duration, Utc};
///
/// let tokens = OAuthTokens {
///     access_token: "BQD...".to_string(),
///     refresh_token: Some("AQC...".to_string()),
///     expires_at: Utc::now() + Duration::hours(1),
/// };
///
/// assert!(!tokens.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens, when issued
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds from now.
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    /// Check if the access token is expired or will expire within five minutes.
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(300)
    }

    /// Check if the access token is expired with a custom buffer
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        let now = chrono::Utc::now();
        let buffer = chrono::Duration::seconds(buffer_seconds);
        now >= self.expires_at - buffer
    }

    /// Get the time remaining until token expiration
    ///
    /// Returns `None` if the token is already expired.
    pub fn time_until_expiry(&self) -> Option<chrono::Duration> {
        let now = chrono::Utc::now();
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Tokens and user identifier produced by a successful code exchange.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    /// Identifier of the user the tokens belong to
    pub user_id: String,
    pub tokens: OAuthTokens,
}

/// Single outcome delivered by the callback listener.
#[derive(Debug)]
pub enum AuthOutcome {
    Success(AuthGrant),
    Failure(AuthError),
}

impl AuthOutcome {
    pub fn into_result(self) -> crate::error::Result<AuthGrant> {
        match self {
            AuthOutcome::Success(session) => Ok(session),
            AuthOutcome::Failure(error) => Err(error),
        }
    }
}
