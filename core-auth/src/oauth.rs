//! OAuth 2.0 Authorization Flow Manager with PKCE Support
//!
//! This module implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) for the
//! interactive authorization-code flow against the playlist service.
//!
//! # Overview
//!
//! The OAuth flow manager handles:
//! - Building authorization URLs with PKCE challenge
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//! - State verification for CSRF protection
//! - Resolving the authenticated user's identifier
//!
//! # Security
//!
//! - Generates cryptographically secure random state and code verifier
//! - Validates state parameter to prevent CSRF attacks
//! - Never logs sensitive values (tokens, codes, verifiers)
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use std::sync::Arc;
//!
//! # fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::spotify(
//!     "client-id",
//!     Some("client-secret".to_string()),
//!     "http://127.0.0.1:8080/callback",
//! );
//!
//! let flow_manager = OAuthFlowManager::new(config, http_client);
//! let (auth_url, pkce_verifier) = flow_manager.build_auth_url()?;
//! // Send the user to auth_url...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use url::Url;

/// Number of random bytes behind both the code verifier and the state token.
const RANDOM_BYTES: usize = 32;

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_USER_INFO_URL: &str = "https://api.spotify.com/v1/me";

/// Scopes needed to read and modify the user's playlists.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "user-read-private",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// URL-safe base64 with the trailing `=` padding stripped.
///
/// ```
/// use core_auth::oauth::encode_base64_without_padding;
///
/// assert_eq!(encode_base64_without_padding(&[112, 105, 122, 122, 97]), "cGl6emE");
/// ```
pub fn encode_base64_without_padding(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Random URL-safe string built from `len` random bytes.
pub fn generate_random_string(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    encode_base64_without_padding(&bytes)
}

/// OAuth 2.0 provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (optional for public clients)
    pub client_secret: Option<String>,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// List of OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Endpoint returning the authenticated user's profile (`{"id": ...}`)
    pub user_info_url: String,
}

impl OAuthConfig {
    /// Configuration for the Spotify accounts service.
    pub fn spotify(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            scopes: SPOTIFY_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            user_info_url: SPOTIFY_USER_INFO_URL.to_string(),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Holds the code verifier and the CSRF state for one authorization attempt.
///
/// # Security
///
/// The verifier must be kept secret and never transmitted to the authorization server.
/// Only the challenge (derived from the verifier) is sent during authorization.
#[derive(Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Create a new PKCE verifier with cryptographically secure random values.
    ///
    /// Both the verifier and the state come from 32 random bytes encoded as
    /// URL-safe base64 without padding (43 characters, within RFC 7636 limits).
    pub fn new() -> Self {
        Self {
            verifier: generate_random_string(RANDOM_BYTES),
            state: generate_random_string(RANDOM_BYTES),
        }
    }

    /// Get the code verifier string.
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Get the state parameter.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compute the code challenge from the verifier.
    ///
    /// Uses S256 method: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        encode_base64_without_padding(&hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &"[REDACTED]")
            .finish()
    }
}

/// OAuth 2.0 flow manager.
///
/// Handles the complete OAuth 2.0 authorization code flow with PKCE support.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    /// Create a new OAuth flow manager with the given configuration.
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Returns both the URL and the PKCE verifier, which must be kept until
    /// the authorization code comes back.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization URL cannot be parsed.
    #[instrument(skip(self))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("response_type", "code");
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", verifier.state());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
        }

        tracing::debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for OAuth tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The state doesn't match (CSRF protection)
    /// - The authorization code is rejected by the token endpoint
    /// - Network errors occur
    #[instrument(skip(self, code, state, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        if state != verifier.state() {
            warn!("OAuth state mismatch on callback");
            return Err(AuthError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: state.to_string(),
            });
        }

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", self.config.redirect_uri.as_str());
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("code_verifier", verifier.verifier());

        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret", client_secret);
        }

        tracing::debug!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .execute(self.token_request(&params)?)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(
                status = status,
                error = %error_body,
                "Token exchange failed while exchanging authorization code"
            );

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        tracing::info!(
            "Exchanged authorization code for tokens (expires in {}s)",
            token_response.expires_in
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }

    /// Refresh an access token using a refresh token.
    ///
    /// Server errors are retried with exponential backoff; client errors are
    /// returned immediately since the refresh token itself is at fault.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", self.config.client_id.as_str());

        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret", client_secret);
        }

        tracing::debug!("Refreshing access token");

        let mut attempts = 0;
        const MAX_RETRIES: u32 = 3;

        loop {
            attempts += 1;

            let response = self
                .http_client
                .execute(self.token_request(&params)?)
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                tracing::info!(
                    "Refreshed access token (expires in {}s)",
                    token_response.expires_in
                );

                // The service may omit the refresh token; keep using the old one.
                return Ok(OAuthTokens::new(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .or_else(|| Some(refresh_token.to_string())),
                    token_response.expires_in,
                ));
            }

            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            if response.is_client_error() {
                warn!(status = status, error = %error_body, "Token refresh rejected");

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            if attempts >= MAX_RETRIES {
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = Duration::from_millis(100 * 2u64.pow(attempts - 1));
            warn!(
                status = status,
                attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Resolve the identifier of the user the access token belongs to.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_user_id(&self, access_token: &str) -> Result<String> {
        let request = HttpRequest::new(HttpMethod::Get, self.config.user_info_url.clone())
            .bearer_token(access_token)
            .header("Accept", "application/json");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            return Err(AuthError::Other(format!(
                "User profile request returned {}",
                response.status
            )));
        }

        let profile: UserProfile = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse user profile: {}", e)))?;

        Ok(profile.id)
    }

    fn token_request(&self, params: &HashMap<&str, &str>) -> Result<HttpRequest> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        Ok(
            HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Bytes::from(encoded_body)),
        )
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait::async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn config() -> OAuthConfig {
        OAuthConfig::spotify(
            "test-client",
            Some("secret".to_string()),
            "http://127.0.0.1:8080/callback",
        )
    }

    #[test]
    fn test_encode_base64_without_padding() {
        assert_eq!(
            encode_base64_without_padding(&[112, 105, 122, 122, 97]),
            "cGl6emE"
        );
    }

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::new();

        assert_eq!(verifier.verifier().len(), 43);
        assert_eq!(verifier.state().len(), 43);
        assert_eq!(verifier.challenge(), verifier.challenge());

        let verifier2 = PkceVerifier::new();
        assert_ne!(verifier.verifier(), verifier2.verifier());
        assert_ne!(verifier.state(), verifier2.state());
    }

    #[test]
    fn test_pkce_challenge_rfc7636_vector() {
        // Appendix B of RFC 7636
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "state".to_string(),
        };

        assert_eq!(
            verifier.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_pkce_debug_redacts() {
        let verifier = PkceVerifier::new();
        let debug = format!("{:?}", verifier);
        assert!(!debug.contains(verifier.verifier()));
    }

    #[test]
    fn test_build_auth_url() {
        let manager = OAuthFlowManager::new(config(), Arc::new(MockHttpClient::new()));
        let (url, verifier) = manager.build_auth_url().unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
        assert!(url.contains("scope=user-read-private+playlist-read-private"));
        assert!(url.contains(&format!("state={}", verifier.state())));
        assert!(url.contains(&format!("code_challenge={}", verifier.challenge())));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_build_auth_url_invalid_url() {
        let mut config = config();
        config.auth_url = "not a valid url".to_string();

        let manager = OAuthFlowManager::new(config, Arc::new(MockHttpClient::new()));
        assert!(manager.build_auth_url().is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_state_mismatch() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let verifier = PkceVerifier::new();
        let result = manager.exchange_code("code", "forged", &verifier).await;

        assert!(matches!(result, Err(AuthError::StateMismatch { .. })));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let verifier = PkceVerifier::new();
        let expected_verifier = verifier.verifier().to_string();

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(move |req| {
            let body = String::from_utf8(req.body.unwrap().to_vec()).unwrap();
            assert!(body.contains("grant_type=authorization_code"));
            assert!(body.contains("code=auth-code"));
            assert!(body.contains(&format!("code_verifier={}", expected_verifier)));
            assert!(body.contains("client_secret=secret"));
            Ok(response(
                200,
                r#"{"access_token":"access","refresh_token":"refresh","expires_in":3600,"token_type":"Bearer"}"#,
            ))
        });

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let tokens = manager
            .exchange_code("auth-code", verifier.state(), &verifier)
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_rejection() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let verifier = PkceVerifier::new();
        let result = manager
            .exchange_code("bad", verifier.state(), &verifier)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidAuthCode(_))));
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, r#"{"access_token":"fresh","expires_in":3600}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let tokens = manager.refresh_access_token("old-refresh").await.unwrap();

        assert_eq!(tokens.access_token, "fresh");
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_refresh_does_not_retry_client_errors() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let result = manager.refresh_access_token("revoked").await;

        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(_))));
    }

    #[tokio::test]
    async fn test_refresh_retries_server_errors() {
        let mut http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(503, "unavailable")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, r#"{"access_token":"fresh"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let tokens = manager.refresh_access_token("refresh").await.unwrap();

        assert_eq!(tokens.access_token, "fresh");
    }

    #[tokio::test]
    async fn test_fetch_user_id() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://api.spotify.com/v1/me");
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer access".to_string())
            );
            Ok(response(200, r#"{"id":"koenrh","display_name":"Koen"}"#))
        });

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        assert_eq!(manager.fetch_user_id("access").await.unwrap(), "koenrh");
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token": "token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }
}
