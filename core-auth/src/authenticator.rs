//! Interactive login: one browser round trip, one outcome.

use crate::callback::CallbackServer;
use crate::error::{AuthError, Result};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::token_source::TokenSource;
use bridge_traits::browser::BrowserLauncher;
use bridge_traits::http::HttpClient;
use core_runtime::logging::AUDIT_TARGET;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

/// An authenticated API session.
pub struct AuthSession {
    /// Identifier of the logged-in user
    pub user_id: String,
    pub tokens: Arc<TokenSource>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Drives the authorization-code flow for a single login.
///
/// [`authenticate`](Self::authenticate) takes `self`, so an authenticator
/// can only ever be awaited once.
pub struct Authenticator {
    flow: Arc<OAuthFlowManager>,
    browser: Arc<dyn BrowserLauncher>,
}

impl Authenticator {
    pub fn new(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        browser: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            flow: Arc::new(OAuthFlowManager::new(config, http_client)),
            browser,
        }
    }

    /// Run the login and block until the callback listener reports success
    /// or failure. There is no timeout.
    ///
    /// # Errors
    ///
    /// Every error is terminal; a new attempt needs fresh user interaction.
    #[instrument(skip(self))]
    pub async fn authenticate(self) -> Result<AuthSession> {
        let server = CallbackServer::bind(&self.flow.config().redirect_uri).await?;
        let (auth_url, verifier) = self.flow.build_auth_url()?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let listener = tokio::spawn(server.serve(self.flow.clone(), verifier, outcome_tx));

        info!(target: AUDIT_TARGET, "open the following URL in your browser: {}", auth_url);
        if let Err(e) = self.browser.open(&auth_url) {
            warn!(error = %e, "Could not open a browser; use the URL above");
        }

        let outcome = match outcome_rx.await {
            Ok(outcome) => outcome,
            // The sender only disappears without an outcome when the listener died.
            Err(_) => {
                return Err(match listener.await {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => AuthError::CallbackServer(
                        "Listener stopped before the flow completed".to_string(),
                    ),
                    Err(e) => AuthError::CallbackServer(e.to_string()),
                });
            }
        };

        match listener.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Callback listener ended with an error"),
            Err(e) => warn!(error = %e, "Callback listener task failed"),
        }

        let grant = outcome.into_result()?;
        info!(target: AUDIT_TARGET, "login spotify:user:{}", grant.user_id);

        Ok(AuthSession {
            user_id: grant.user_id,
            tokens: Arc::new(TokenSource::new(self.flow, grant.tokens)),
        })
    }
}
