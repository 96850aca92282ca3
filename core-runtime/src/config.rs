//! # Sync Configuration
//!
//! Provides configuration management for a sync run.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`SyncConfig`]. `build()` validates everything up front so a run never
//! starts with settings it cannot honour. API credentials are kept apart in
//! [`Credentials`] and are only ever read from the environment.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{Credentials, FailurePolicy, SyncConfig};
//!
//! let config = SyncConfig::builder()
//!     .base_id("appXXXXXXXXXXXXXX")
//!     .table("Tracks")
//!     .failure_policy(FailurePolicy::Continue)
//!     .build()?;
//!
//! let credentials = Credentials::from_env()?;
//! ```

use crate::error::{Error, Result};
use chrono::Datelike;
use std::fmt;

/// Default prefix marking playlists this tool owns.
pub const DEFAULT_PLAYLIST_PREFIX: &str = "st";

/// First year covered by the yearly and decade buckets.
pub const DEFAULT_EPOCH: i32 = 1970;

/// Width of a decade bucket in years.
pub const DEFAULT_DECADE_YEARS: i32 = 10;

/// Description attached to every playlist the tool creates.
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "Managed by Spotitable";

/// Loopback redirect registered with the identity provider.
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

/// Environment variable holding the Spotify client ID.
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the Spotify client secret.
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
/// Environment variable holding the Airtable API key.
pub const ENV_AIRTABLE_API_KEY: &str = "AIRTABLE_API_KEY";

/// What the driver does when one bucket fails to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run at the first failing bucket.
    #[default]
    Abort,
    /// Log the failure and move on to the next bucket.
    Continue,
}

/// Settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Record store base identifier
    pub base_id: String,

    /// Record store table holding the track records
    pub table: String,

    /// Prefix that marks managed playlists (joined with `-`)
    pub playlist_prefix: String,

    /// First year of the yearly/decade buckets
    pub epoch: i32,

    /// Last year of the yearly buckets, inclusive
    pub current_year: i32,

    /// Decade bucket width in years
    pub decade_years: i32,

    /// Description for newly created playlists
    pub playlist_description: String,

    /// Drop repeated track IDs from the desired set, keeping the first occurrence
    pub dedupe_desired: bool,

    /// Per-bucket failure handling
    pub failure_policy: FailurePolicy,

    /// OAuth redirect URI served by the local callback listener
    pub redirect_uri: String,
}

impl SyncConfig {
    /// Creates a new builder for constructing a `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Prefix including the trailing separator, e.g. `st-`.
    pub fn managed_prefix(&self) -> String {
        format!("{}-", self.playlist_prefix)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.base_id.trim().is_empty() {
            return Err(Error::Config("Record store base ID cannot be empty".to_string()));
        }

        if self.table.trim().is_empty() {
            return Err(Error::Config("Record store table cannot be empty".to_string()));
        }

        if self.playlist_prefix.trim().is_empty() {
            return Err(Error::Config(
                "Playlist prefix cannot be empty; it protects user-created playlists"
                    .to_string(),
            ));
        }

        if self.decade_years <= 0 {
            return Err(Error::Config(
                "Decade width must be greater than 0 years".to_string(),
            ));
        }

        if self.epoch > self.current_year {
            return Err(Error::Config(format!(
                "Epoch {} is after the current year {}",
                self.epoch, self.current_year
            )));
        }

        if !self.redirect_uri.starts_with("http://") {
            return Err(Error::Config(format!(
                "Redirect URI must be a loopback http:// URL, got {}",
                self.redirect_uri
            )));
        }

        Ok(())
    }
}

/// Builder for constructing [`SyncConfig`] instances.
///
/// Only `base_id` and `table` are required; everything else has a default.
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    base_id: Option<String>,
    table: Option<String>,
    playlist_prefix: Option<String>,
    epoch: Option<i32>,
    current_year: Option<i32>,
    decade_years: Option<i32>,
    playlist_description: Option<String>,
    dedupe_desired: Option<bool>,
    failure_policy: Option<FailurePolicy>,
    redirect_uri: Option<String>,
}

impl SyncConfigBuilder {
    pub fn base_id(mut self, base_id: impl Into<String>) -> Self {
        self.base_id = Some(base_id.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn playlist_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.playlist_prefix = Some(prefix.into());
        self
    }

    pub fn epoch(mut self, epoch: i32) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Override the current year (defaults to the local clock).
    pub fn current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn decade_years(mut self, years: i32) -> Self {
        self.decade_years = Some(years);
        self
    }

    pub fn playlist_description(mut self, description: impl Into<String>) -> Self {
        self.playlist_description = Some(description.into());
        self
    }

    pub fn dedupe_desired(mut self, dedupe: bool) -> Self {
        self.dedupe_desired = Some(dedupe);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required field is missing or a value
    /// fails validation.
    pub fn build(self) -> Result<SyncConfig> {
        let base_id = self
            .base_id
            .ok_or_else(|| Error::Config("Record store base ID is required".to_string()))?;
        let table = self
            .table
            .ok_or_else(|| Error::Config("Record store table is required".to_string()))?;

        let config = SyncConfig {
            base_id,
            table,
            playlist_prefix: self
                .playlist_prefix
                .unwrap_or_else(|| DEFAULT_PLAYLIST_PREFIX.to_string()),
            epoch: self.epoch.unwrap_or(DEFAULT_EPOCH),
            current_year: self
                .current_year
                .unwrap_or_else(|| chrono::Local::now().year()),
            decade_years: self.decade_years.unwrap_or(DEFAULT_DECADE_YEARS),
            playlist_description: self
                .playlist_description
                .unwrap_or_else(|| DEFAULT_PLAYLIST_DESCRIPTION.to_string()),
            dedupe_desired: self.dedupe_desired.unwrap_or(true),
            failure_policy: self.failure_policy.unwrap_or_default(),
            redirect_uri: self
                .redirect_uri
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}

/// API credentials read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub airtable_api_key: String,
}

impl Credentials {
    /// Variables that must be present, in the order they are checked.
    pub const REQUIRED_VARS: [&'static str; 3] = [
        ENV_SPOTIFY_CLIENT_ID,
        ENV_SPOTIFY_CLIENT_SECRET,
        ENV_AIRTABLE_API_KEY,
    ];

    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] naming the first absent variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require =
            |name: &str| lookup(name).ok_or_else(|| Error::MissingEnv(name.to_string()));

        // Fields are evaluated in order, so the first missing variable is reported.
        Ok(Self {
            spotify_client_id: require(ENV_SPOTIFY_CLIENT_ID)?,
            spotify_client_secret: require(ENV_SPOTIFY_CLIENT_SECRET)?,
            airtable_api_key: require(ENV_AIRTABLE_API_KEY)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &"[REDACTED]")
            .field("airtable_api_key", &"[REDACTED]")
            .finish()
    }
}
