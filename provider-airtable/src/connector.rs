//! Airtable REST API connector
//!
//! Implements the `RecordStore` trait by listing records of a table through
//! a filter formula and projecting their Spotify track ID.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playlist::TrackId;
use bridge_traits::records::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::AirtableError;
use crate::types::{ErrorEnvelope, ListRecordsResponse};

const AIRTABLE_API_BASE: &str = "https://api.airtable.com/v0";

/// Column holding the Spotify track ID of each record.
pub const SPOTIFY_ID_FIELD: &str = "Spotify ID";

/// Largest page the list-records endpoint serves.
const PAGE_SIZE: u32 = 100;

/// Airtable asks clients to back off for 30 seconds after a 429.
const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(30);
const MAX_RATE_LIMIT_WAITS: u32 = 3;

/// Airtable connector bound to one base.
pub struct AirtableConnector {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_id: String,
    base_url: String,
    rate_limit_backoff: Duration,
}

impl AirtableConnector {
    /// Create a connector for `base_id` authenticated with `api_key`.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        base_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_id: base_id.into(),
            base_url: AIRTABLE_API_BASE.to_string(),
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Wait used when a 429 carries no `Retry-After` header.
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(&self.base_id),
            urlencoding::encode(table)
        )
    }

    fn api_error(response: &HttpResponse) -> AirtableError {
        let message = serde_json::from_slice::<ErrorEnvelope>(&response.body)
            .map(|envelope| envelope.error.describe())
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());

        AirtableError::ApiError {
            status_code: response.status,
            message,
        }
    }

    async fn fetch_page(
        &self,
        table: &str,
        filter: &str,
        offset: Option<&str>,
    ) -> Result<ListRecordsResponse> {
        let page_size = PAGE_SIZE.to_string();
        let mut rate_limited = 0;

        loop {
            let mut request = HttpRequest::new(HttpMethod::Get, self.table_url(table))
                .bearer_token(&self.api_key)
                .header("Accept", "application/json")
                .timeout(Duration::from_secs(30))
                .query(&[
                    ("filterByFormula", filter),
                    ("pageSize", page_size.as_str()),
                    ("fields[]", SPOTIFY_ID_FIELD),
                ]);
            if let Some(offset) = offset {
                request = request.query(&[("offset", offset)]);
            }

            let response = self.http_client.execute(request).await?;

            if response.is_success() {
                return serde_json::from_slice(&response.body).map_err(|e| {
                    AirtableError::ParseError(format!("Failed to parse records page: {}", e))
                        .into()
                });
            }

            if response.status == 429 {
                let wait = response
                    .header("Retry-After")
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(self.rate_limit_backoff);

                rate_limited += 1;
                if rate_limited > MAX_RATE_LIMIT_WAITS {
                    return Err(AirtableError::RateLimitExceeded {
                        retry_after_seconds: wait.as_secs(),
                    }
                    .into());
                }

                warn!(
                    "Record store rate limited (wait {}/{}), retrying in {}ms",
                    rate_limited,
                    MAX_RATE_LIMIT_WAITS,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            warn!("Record store request failed: status={}", response.status);
            return Err(Self::api_error(&response).into());
        }
    }
}

#[async_trait]
impl RecordStore for AirtableConnector {
    /// Every matching record's Spotify ID, in record order across all pages.
    ///
    /// Records with an empty `Spotify ID` cell are skipped.
    #[instrument(skip(self), fields(base = %self.base_id))]
    async fn list_track_ids(&self, table: &str, filter: &str) -> Result<Vec<TrackId>> {
        let mut track_ids = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(table, filter, offset.as_deref()).await?;
            pages += 1;

            for record in &page.records {
                match record.text(SPOTIFY_ID_FIELD) {
                    Some(id) => track_ids.push(TrackId::from(id)),
                    None => debug!(record = %record.id, "Record has no Spotify ID, skipping"),
                }
            }

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        debug!("Fetched {} track IDs in {} page(s)", track_ids.len(), pages);
        Ok(track_ids)
    }
}
