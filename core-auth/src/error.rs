use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("OAuth state mismatch")]
    StateMismatch { expected: String, actual: String },

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Callback listener failed: {0}")]
    CallbackServer(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
