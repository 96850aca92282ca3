//! spotitable - keep managed Spotify playlists in step with an Airtable base
//!
//! Every run logs in once through the browser, then rebuilds one playlist
//! per bucket (each year, each decade, liked, loved) from the records in the
//! given table.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_desktop::{ReqwestHttpClient, SystemBrowser};
use bridge_traits::{BrowserLauncher, HttpClient, NoopBrowser, PlaylistService, RecordStore};
use clap::Parser;
use core_auth::{Authenticator, OAuthConfig};
use core_runtime::config::{
    Credentials, FailurePolicy, SyncConfig, DEFAULT_EPOCH, DEFAULT_PLAYLIST_PREFIX,
};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_sync::{RemoteStateCache, SyncDriver, SyncEngine, SyncError, SyncSummary};
use provider_airtable::AirtableConnector;
use provider_spotify::SpotifyConnector;
use tracing::{debug, info, warn};

/// Command-line arguments for spotitable
#[derive(Parser, Debug)]
#[command(name = "spotitable")]
#[command(about = "Sync Airtable track buckets into managed Spotify playlists")]
#[command(version)]
struct Args {
    /// Airtable base ID
    #[arg(long)]
    base: String,

    /// Airtable table holding the tracks
    #[arg(long)]
    table: String,

    /// Prefix of managed playlist names
    #[arg(long, default_value = DEFAULT_PLAYLIST_PREFIX)]
    prefix: String,

    /// First year of the yearly and decade playlists
    #[arg(long, default_value_t = DEFAULT_EPOCH)]
    epoch: i32,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SPOTITABLE_LOG_LEVEL")]
    log_level: LogLevel,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "SPOTITABLE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Keep going when a bucket fails instead of stopping the run
    #[arg(long)]
    continue_on_error: bool,

    /// Do not try to open a browser; only print the login URL
    #[arg(long)]
    no_browser: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logging is not up yet; report the problem once it is.
    let dotenv_error = dotenv_problem(dotenvy::dotenv());

    match run(args, dotenv_error).await {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!("error: {} bucket(s) failed", summary.buckets_failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// A missing `.env` file is fine since the variables may come from the shell.
fn dotenv_problem<T>(loaded: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match loaded {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

async fn run(args: Args, dotenv_error: Option<dotenvy::Error>) -> Result<SyncSummary> {
    let mut logging = LoggingConfig::default().with_level(args.log_level);
    if let Some(format) = args.log_format {
        logging = logging.with_format(format);
    }
    init_logging(logging).context("Failed to initialize logging")?;

    if let Some(e) = dotenv_error {
        debug!(error = %e, "Could not load .env file");
    }

    let credentials = Credentials::from_env()?;

    let policy = if args.continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let config = SyncConfig::builder()
        .base_id(&args.base)
        .table(&args.table)
        .playlist_prefix(&args.prefix)
        .epoch(args.epoch)
        .failure_policy(policy)
        .build()?;

    info!(
        base = %config.base_id,
        table = %config.table,
        prefix = %config.playlist_prefix,
        years = %format!("{}-{}", config.epoch, config.current_year),
        "Starting sync"
    );

    let http: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new().context("Failed to create HTTP client")?);
    let browser: Arc<dyn BrowserLauncher> = if args.no_browser {
        Arc::new(NoopBrowser)
    } else {
        Arc::new(SystemBrowser)
    };

    let oauth = OAuthConfig::spotify(
        credentials.spotify_client_id.clone(),
        Some(credentials.spotify_client_secret.clone()),
        config.redirect_uri.clone(),
    );
    let session = Authenticator::new(oauth, http.clone(), browser)
        .authenticate()
        .await
        .map_err(|e| SyncError::Authorization(e.to_string()))?;

    let spotify: Arc<dyn PlaylistService> =
        Arc::new(SpotifyConnector::new(http.clone(), session.tokens.clone()));
    let airtable: Arc<dyn RecordStore> = Arc::new(AirtableConnector::new(
        http,
        credentials.airtable_api_key.clone(),
        config.base_id.clone(),
    ));

    let engine = SyncEngine::new(
        spotify,
        session.user_id.clone(),
        RemoteStateCache::new(config.managed_prefix()),
    )
    .with_description(config.playlist_description.clone())
    .with_dedupe(config.dedupe_desired);

    let mut driver = SyncDriver::new(engine, airtable, config);
    let summary = driver.run().await.context("Sync aborted")?;

    if !summary.is_clean() {
        warn!(failed = summary.buckets_failed, "Sync finished with failed buckets");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let missing: dotenvy::Result<()> = Err(dotenvy::Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no .env",
        )));
        assert!(dotenv_problem(missing).is_none());
        assert!(dotenv_problem(Ok(())).is_none());
    }

    #[test]
    fn test_broken_dotenv_is_reported() {
        let malformed: dotenvy::Result<()> =
            Err(dotenvy::Error::LineParse("AIRTABLE_API_KEY key".to_string(), 16));
        assert!(matches!(
            dotenv_problem(malformed),
            Some(dotenvy::Error::LineParse(_, 16))
        ));

        let unreadable: dotenvy::Result<()> = Err(dotenvy::Error::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert!(dotenv_problem(unreadable).is_some());
    }
}
