//! Local authorization callback listener.
//!
//! Receives the identity provider's redirect on the loopback interface,
//! exchanges the authorization code, renders a small HTML page for the user
//! and hands exactly one [`AuthOutcome`] to the waiting caller.

use crate::error::{AuthError, Result};
use crate::oauth::{OAuthFlowManager, PkceVerifier};
use crate::types::{AuthGrant, AuthOutcome};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, info, warn};
use url::Url;

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Loopback listener bound to the host, port and path of the redirect URI.
pub struct CallbackServer {
    listener: TcpListener,
    path: String,
}

impl CallbackServer {
    /// Bind the listener described by `redirect_uri`.
    ///
    /// Binding happens before the authorization URL is shown so a port
    /// conflict is reported before the user is sent anywhere.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| AuthError::CallbackServer(format!("Invalid redirect URI: {}", e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| AuthError::CallbackServer("Redirect URI has no host".to_string()))?
            .to_string();
        let port = url.port_or_known_default().ok_or_else(|| {
            AuthError::CallbackServer("Redirect URI has no port".to_string())
        })?;

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| {
                AuthError::CallbackServer(format!("Failed to bind {}:{}: {}", host, port, e))
            })?;

        debug!(host = %host, port = port, path = url.path(), "Callback listener bound");

        Ok(Self {
            listener,
            path: url.path().to_string(),
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServer(e.to_string()))
    }

    /// Serve redirects until the single outcome has been delivered.
    pub async fn serve(
        self,
        flow: Arc<OAuthFlowManager>,
        verifier: PkceVerifier,
        outcome: oneshot::Sender<AuthOutcome>,
    ) -> Result<()> {
        let state = CallbackState::new(flow, verifier, outcome);
        let shutdown = state.shutdown.clone();

        let mut router = Router::new().route(&self.path, get(handle_callback));
        if self.path != "/" {
            router = router.route("/", get(|| async {}));
        }

        axum::serve(self.listener, router.with_state(state))
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .map_err(|e| AuthError::CallbackServer(e.to_string()))
    }
}

#[derive(Clone)]
struct CallbackState {
    flow: Arc<OAuthFlowManager>,
    verifier: Arc<PkceVerifier>,
    outcome: Arc<Mutex<Option<oneshot::Sender<AuthOutcome>>>>,
    shutdown: Arc<Notify>,
}

impl CallbackState {
    fn new(
        flow: Arc<OAuthFlowManager>,
        verifier: PkceVerifier,
        outcome: oneshot::Sender<AuthOutcome>,
    ) -> Self {
        Self {
            flow,
            verifier: Arc::new(verifier),
            outcome: Arc::new(Mutex::new(Some(outcome))),
            shutdown: Arc::new(Notify::new()),
        }
    }

    fn take_sender(&self) -> Option<oneshot::Sender<AuthOutcome>> {
        match self.outcome.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn deliver(&self, sender: oneshot::Sender<AuthOutcome>, outcome: AuthOutcome) {
        if sender.send(outcome).is_err() {
            warn!("Authorization outcome produced after the caller stopped waiting");
        }
        self.shutdown.notify_one();
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, Html<String>) {
    // Whoever takes the sender owns the one and only outcome.
    let Some(sender) = state.take_sender() else {
        debug!("Ignoring redirect after the flow completed");
        return (
            StatusCode::OK,
            Html(page("Authentication already completed. Return to your terminal.")),
        );
    };

    if let Some(error) = query.error {
        warn!(error = %error, "Authorization denied by provider");
        let body = error_page(&error);
        state.deliver(
            sender,
            AuthOutcome::Failure(AuthError::AuthorizationDenied(error)),
        );
        return (StatusCode::OK, Html(body));
    }

    let Some(code) = query.code else {
        state.deliver(
            sender,
            AuthOutcome::Failure(AuthError::InvalidAuthCode(
                "Redirect carried no authorization code".to_string(),
            )),
        );
        return (
            StatusCode::BAD_REQUEST,
            Html(error_page("missing authorization code")),
        );
    };

    let returned_state = query.state.unwrap_or_default();
    match complete_exchange(&state, &code, &returned_state).await {
        Ok(grant) => {
            info!("Authorization code exchanged");
            let body = success_page(&grant.user_id);
            state.deliver(sender, AuthOutcome::Success(grant));
            (StatusCode::OK, Html(body))
        }
        Err(err) => {
            warn!(error = %err, "Token exchange failed");
            state.deliver(sender, AuthOutcome::Failure(err));
            (StatusCode::FORBIDDEN, Html(page("could not get token")))
        }
    }
}

async fn complete_exchange(state: &CallbackState, code: &str, returned: &str) -> Result<AuthGrant> {
    let tokens = state
        .flow
        .exchange_code(code, returned, &state.verifier)
        .await?;
    let user_id = state.flow.fetch_user_id(&tokens.access_token).await?;
    Ok(AuthGrant { user_id, tokens })
}

fn success_page(user_id: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body><p>Authenticated as: <strong>{}</strong></p>\
         <p>Return to your terminal to continue.</p></body></html>",
        htmlescape::encode_minimal(user_id)
    )
}

fn error_page(error: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body><p><strong>Error</strong>: {}</p></body></html>",
        htmlescape::encode_minimal(error)
    )
}

fn page(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body><p>{}</p></body></html>",
        htmlescape::encode_minimal(message)
    )
}
