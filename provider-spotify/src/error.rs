//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Spotify provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// No usable access token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Spotify API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit still in force after the allowed number of waits
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Request exceeds a per-call ceiling of the Web API
    #[error("Too many items in one request: {count} (limit {limit})")]
    TooManyItems { count: usize, limit: usize },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<core_auth::AuthError> for SpotifyError {
    fn from(error: core_auth::AuthError) -> Self {
        SpotifyError::AuthenticationFailed(error.to_string())
    }
}

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::ApiError {
                status_code,
                message,
            } => BridgeError::Api {
                status: status_code,
                message,
            },
            SpotifyError::RateLimitExceeded {
                retry_after_seconds,
            } => BridgeError::RateLimited {
                retry_after_secs: retry_after_seconds,
            },
            SpotifyError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
