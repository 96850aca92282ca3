//! # Authentication Module
//!
//! Interactive OAuth 2.0 login for the playlist service.
//!
//! ## Overview
//!
//! This crate runs the authorization-code flow with PKCE against the
//! provider's accounts service. A loopback listener receives the redirect,
//! exchanges the code and hands exactly one outcome back to the waiting
//! caller. The resulting [`AuthSession`] carries the user identifier and a
//! [`TokenSource`] that refreshes the access token on demand.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization flow with PKCE (S256)
//! - CSRF protection through a random state token
//! - One-shot callback handoff (success or failure, never both)
//! - Automatic token refresh before expiration

pub mod authenticator;
pub mod callback;
pub mod error;
pub mod oauth;
pub mod token_source;
pub mod types;

pub use authenticator::{AuthSession, Authenticator};
pub use callback::CallbackServer;
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_source::{AccessTokenProvider, StaticToken, TokenSource};
pub use types::{AuthGrant, AuthOutcome, OAuthTokens};
