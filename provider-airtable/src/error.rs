//! Error types for the Airtable provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirtableError {
    #[error("Airtable API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, AirtableError>;

impl From<AirtableError> for BridgeError {
    fn from(error: AirtableError) -> Self {
        match error {
            AirtableError::ApiError {
                status_code,
                message,
            } => BridgeError::Api {
                status: status_code,
                message,
            },
            AirtableError::RateLimitExceeded {
                retry_after_seconds,
            } => BridgeError::RateLimited {
                retry_after_secs: retry_after_seconds,
            },
            AirtableError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            AirtableError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AirtableError::ApiError {
            status_code: 422,
            message: "INVALID_FILTER_BY_FORMULA".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Airtable API error (status 422): INVALID_FILTER_BY_FORMULA"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: BridgeError = AirtableError::ApiError {
            status_code: 404,
            message: "TABLE_NOT_FOUND".to_string(),
        }
        .into();
        assert_eq!(bridge_error.status(), Some(404));
    }
}
