//! Spotify Web API connector implementation
//!
//! Implements the `PlaylistService` trait for the Spotify Web API.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playlist::{
    NewPlaylist, Page, PageRequest, PlaylistId, PlaylistService, PlaylistSummary, TrackId,
};
use core_auth::AccessTokenProvider;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::SpotifyError;
use crate::types::{
    AddTracksBody, CreatePlaylistBody, ErrorEnvelope, Paging, PlaylistTrackItem,
    RemoveTracksBody, SeveralTracksResponse, SimplifiedPlaylist, TrackUri, UserProfile,
};

/// Spotify Web API base URL
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Maximum IDs per `GET /tracks` lookup
pub const MAX_TRACKS_PER_LOOKUP: usize = 50;

/// Maximum playlists per page of `GET /users/{id}/playlists`
pub const MAX_PLAYLISTS_PER_PAGE: u32 = 50;

/// Maximum tracks per playlist page and per add/remove request
pub const MAX_PLAYLIST_TRACKS: usize = 100;

/// Only the track IDs and paging data are needed from playlist listings.
const PLAYLIST_TRACK_FIELDS: &str = "items(track(id)),total,next";

const MAX_RATE_LIMIT_WAITS: u32 = 5;
const MAX_SERVER_RETRIES: u32 = 3;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Spotify Web API connector
///
/// # Features
///
/// - Offset pagination with the page limits the Web API enforces
/// - `Retry-After` handling for HTTP 429
/// - Exponential backoff for 5xx responses on reads
/// - Bearer token obtained per request from an [`AccessTokenProvider`]
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::playlist::PlaylistService;
///
/// let connector = SpotifyConnector::new(http_client, session.tokens.clone());
/// let user_id = connector.current_user_id().await?;
/// ```
pub struct SpotifyConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of OAuth 2.0 access tokens
    tokens: Arc<dyn AccessTokenProvider>,

    base_url: String,
}

impl SpotifyConnector {
    /// Create a new Spotify connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `tokens` - access tokens carrying the playlist read/modify scopes
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
            base_url: SPOTIFY_API_BASE.to_string(),
        }
    }

    /// Point the connector at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn track_uri(track_id: &TrackId) -> String {
        format!("spotify:track:{}", track_id)
    }

    fn check_limit(count: usize, limit: usize) -> Result<()> {
        if count > limit {
            return Err(SpotifyError::TooManyItems { count, limit }.into());
        }
        Ok(())
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| {
            SpotifyError::ParseError(format!("Failed to parse {}: {}", what, e)).into()
        })
    }

    fn api_error(response: &HttpResponse) -> SpotifyError {
        let message = serde_json::from_slice::<ErrorEnvelope>(&response.body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());

        SpotifyError::ApiError {
            status_code: response.status,
            message,
        }
    }

    /// Execute API request with retry logic
    ///
    /// 429 responses wait for the server's `Retry-After` hint. Server errors
    /// are retried with exponential backoff for reads only; a mutation may
    /// already have been applied.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut rate_limited = 0;
        let mut server_errors = 0;

        loop {
            let token = self
                .tokens
                .access_token()
                .await
                .map_err(SpotifyError::from)?;

            let attempt = request
                .clone()
                .bearer_token(token)
                .header("Accept", "application/json")
                .timeout(Duration::from_secs(30));

            let response = self.http_client.execute(attempt).await?;
            let status = response.status;

            if response.is_success() {
                debug!("API request succeeded: status={}", status);
                return Ok(response);
            }

            if status == 429 {
                let retry_after = response
                    .header("Retry-After")
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                rate_limited += 1;
                if rate_limited > MAX_RATE_LIMIT_WAITS {
                    warn!("Rate limited after {} waits", MAX_RATE_LIMIT_WAITS);
                    return Err(SpotifyError::RateLimitExceeded {
                        retry_after_seconds: retry_after,
                    }
                    .into());
                }

                warn!(
                    "Rate limited (wait {}/{}), retrying in {}s",
                    rate_limited, MAX_RATE_LIMIT_WAITS, retry_after
                );
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            if response.is_server_error() && request.method.is_idempotent_read() {
                server_errors += 1;
                if server_errors < MAX_SERVER_RETRIES {
                    let backoff_ms = 100u64 * 2u64.pow(server_errors);
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                        server_errors, MAX_SERVER_RETRIES, status, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    continue;
                }
            }

            warn!("API request failed: status={}", status);
            return Err(Self::api_error(&response).into());
        }
    }
}

#[async_trait]
impl PlaylistService for SpotifyConnector {
    #[instrument(skip(self))]
    async fn current_user_id(&self) -> Result<String> {
        let request = HttpRequest::new(HttpMethod::Get, self.url("/me"));
        let response = self.execute(request).await?;
        let profile: UserProfile = Self::parse(&response, "user profile")?;
        Ok(profile.id)
    }

    #[instrument(skip(self), fields(offset = page.offset))]
    async fn list_user_playlists(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Page<PlaylistSummary>> {
        // A silently smaller page would make the caller's next offset skip items
        Self::check_limit(page.limit as usize, MAX_PLAYLISTS_PER_PAGE as usize)?;
        let limit = page.limit;
        let request = HttpRequest::new(
            HttpMethod::Get,
            self.url(&format!("/users/{}/playlists", urlencoding::encode(user_id))),
        )
        .query(&[
            ("limit", limit.to_string()),
            ("offset", page.offset.to_string()),
        ]);

        let response = self.execute(request).await?;
        let paging: Paging<SimplifiedPlaylist> = Self::parse(&response, "playlist page")?;

        debug!(
            "Listed {} playlists (total {})",
            paging.items.len(),
            paging.total
        );

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|playlist| PlaylistSummary {
                    id: PlaylistId::new(playlist.id),
                    name: playlist.name,
                })
                .collect(),
            total: paging.total,
            next: paging.next,
        })
    }

    #[instrument(skip(self), fields(playlist = %playlist_id, offset = page.offset))]
    async fn list_playlist_tracks(
        &self,
        playlist_id: &PlaylistId,
        page: PageRequest,
    ) -> Result<Page<TrackId>> {
        Self::check_limit(page.limit as usize, MAX_PLAYLIST_TRACKS)?;
        let limit = page.limit;
        let request = HttpRequest::new(
            HttpMethod::Get,
            self.url(&format!(
                "/playlists/{}/tracks",
                urlencoding::encode(playlist_id.as_str())
            )),
        )
        .query(&[
            ("limit", limit.to_string()),
            ("offset", page.offset.to_string()),
            ("fields", PLAYLIST_TRACK_FIELDS.to_string()),
        ]);

        let response = self.execute(request).await?;
        let paging: Paging<PlaylistTrackItem> = Self::parse(&response, "playlist tracks")?;

        // Local files and unavailable tracks carry no ID
        let items = paging
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(|track| track.id))
            .map(TrackId::from)
            .collect();

        Ok(Page {
            items,
            total: paging.total,
            next: paging.next,
        })
    }

    #[instrument(skip(self, playlist), fields(name = %playlist.name))]
    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: NewPlaylist,
    ) -> Result<PlaylistSummary> {
        let body = CreatePlaylistBody {
            name: &playlist.name,
            description: &playlist.description,
            public: playlist.public,
            collaborative: playlist.collaborative,
        };
        let request = HttpRequest::new(
            HttpMethod::Post,
            self.url(&format!("/users/{}/playlists", urlencoding::encode(user_id))),
        )
        .json(&body)?;

        let response = self.execute(request).await?;
        let created: SimplifiedPlaylist = Self::parse(&response, "created playlist")?;

        Ok(PlaylistSummary {
            id: PlaylistId::new(created.id),
            name: created.name,
        })
    }

    #[instrument(skip(self, track_ids), fields(count = track_ids.len()))]
    async fn get_tracks(&self, track_ids: &[TrackId]) -> Result<Vec<Option<TrackId>>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        Self::check_limit(track_ids.len(), MAX_TRACKS_PER_LOOKUP)?;

        let ids = track_ids
            .iter()
            .map(TrackId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let request = HttpRequest::new(HttpMethod::Get, self.url("/tracks")).query(&[("ids", ids)]);

        let response = self.execute(request).await?;
        let several: SeveralTracksResponse = Self::parse(&response, "track lookup")?;

        if several.tracks.len() != track_ids.len() {
            return Err(SpotifyError::ParseError(format!(
                "Track lookup returned {} entries for {} IDs",
                several.tracks.len(),
                track_ids.len()
            ))
            .into());
        }

        Ok(several
            .tracks
            .into_iter()
            .map(|track| track.and_then(|t| t.id).map(TrackId::from))
            .collect())
    }

    #[instrument(skip(self, track_ids), fields(playlist = %playlist_id, count = track_ids.len()))]
    async fn add_tracks(&self, playlist_id: &PlaylistId, track_ids: &[TrackId]) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        Self::check_limit(track_ids.len(), MAX_PLAYLIST_TRACKS)?;

        let body = AddTracksBody {
            uris: track_ids.iter().map(Self::track_uri).collect(),
        };
        let request = HttpRequest::new(
            HttpMethod::Post,
            self.url(&format!(
                "/playlists/{}/tracks",
                urlencoding::encode(playlist_id.as_str())
            )),
        )
        .json(&body)?;

        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self, track_ids), fields(playlist = %playlist_id, count = track_ids.len()))]
    async fn remove_tracks(&self, playlist_id: &PlaylistId, track_ids: &[TrackId]) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        Self::check_limit(track_ids.len(), MAX_PLAYLIST_TRACKS)?;

        let body = RemoveTracksBody {
            tracks: track_ids
                .iter()
                .map(|id| TrackUri {
                    uri: Self::track_uri(id),
                })
                .collect(),
        };
        let request = HttpRequest::new(
            HttpMethod::Delete,
            self.url(&format!(
                "/playlists/{}/tracks",
                urlencoding::encode(playlist_id.as_str())
            )),
        )
        .json(&body)?;

        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bytes::Bytes;
    use core_auth::StaticToken;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn connector(mock_http: MockHttpClient) -> SpotifyConnector {
        SpotifyConnector::new(
            Arc::new(mock_http),
            Arc::new(StaticToken("test_token".to_string())),
        )
    }

    fn body_json(request: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_current_user_id() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://api.spotify.com/v1/me");
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer test_token".to_string())
            );
            Ok(response(200, r#"{"id":"koenrh","display_name":"Koen"}"#))
        });

        let user_id = connector(mock_http).current_user_id().await.unwrap();
        assert_eq!(user_id, "koenrh");
    }

    #[tokio::test]
    async fn test_list_user_playlists_page() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req
                .url
                .starts_with("https://api.spotify.com/v1/users/koenrh/playlists?"));
            assert!(req.url.contains("limit=50"));
            assert!(req.url.contains("offset=50"));
            Ok(response(
                200,
                r#"{
                    "items": [
                        {"id": "foo1", "name": "st-foo"},
                        {"id": "bar1", "name": "Road trip"}
                    ],
                    "total": 52,
                    "next": null
                }"#,
            ))
        });

        let page = connector(mock_http)
            .list_user_playlists("koenrh", PageRequest::first(50).advance())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, PlaylistId::from("foo1"));
        assert_eq!(page.items[0].name, "st-foo");
        assert_eq!(page.total, 52);
        assert!(!page.has_more(100));
    }

    #[tokio::test]
    async fn test_list_playlist_tracks_skips_unavailable() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("/playlists/foo1/tracks?"));
            assert!(req.url.contains("limit=100"));
            Ok(response(
                200,
                r#"{
                    "items": [
                        {"track": {"id": "t1"}},
                        {"track": {"id": null}},
                        {"track": null},
                        {"track": {"id": "t2"}}
                    ],
                    "total": 4,
                    "next": "https://api.spotify.com/v1/playlists/foo1/tracks?offset=100"
                }"#,
            ))
        });

        let page = connector(mock_http)
            .list_playlist_tracks(&PlaylistId::from("foo1"), PageRequest::first(100))
            .await
            .unwrap();

        assert_eq!(page.items, vec![TrackId::from("t1"), TrackId::from("t2")]);
        // Cursor present but the offset is past the declared total
        assert!(!page.has_more(100));
    }

    #[tokio::test]
    async fn test_oversized_pages_are_rejected() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);
        let connector = connector(mock_http);

        let playlists = connector
            .list_user_playlists("koenrh", PageRequest::first(100))
            .await;
        assert!(matches!(
            playlists,
            Err(BridgeError::OperationFailed(ref msg)) if msg.contains("100")
        ));

        let tracks = connector
            .list_playlist_tracks(&PlaylistId::from("foo1"), PageRequest::first(101))
            .await;
        assert!(tracks.is_err());
    }

    #[tokio::test]
    async fn test_create_playlist() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            assert!(req.url.ends_with("/users/koenrh/playlists"));
            let body = body_json(&req);
            assert_eq!(body["name"], "st-year-1999");
            assert_eq!(body["description"], "Managed by Spotitable");
            assert_eq!(body["public"], false);
            assert_eq!(body["collaborative"], false);
            Ok(response(201, r#"{"id":"new1","name":"st-year-1999"}"#))
        });

        let created = connector(mock_http)
            .create_playlist(
                "koenrh",
                NewPlaylist::private("st-year-1999", "Managed by Spotitable"),
            )
            .await
            .unwrap();

        assert_eq!(created.id, PlaylistId::from("new1"));
    }

    #[tokio::test]
    async fn test_get_tracks_aligns_missing() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/tracks?ids=a%2Cb%2Cc"));
            Ok(response(
                200,
                r#"{"tracks":[{"id":"a"},null,{"id":"c"}]}"#,
            ))
        });

        let ids = vec![TrackId::from("a"), TrackId::from("b"), TrackId::from("c")];
        let found = connector(mock_http).get_tracks(&ids).await.unwrap();

        assert_eq!(
            found,
            vec![Some(TrackId::from("a")), None, Some(TrackId::from("c"))]
        );
    }

    #[tokio::test]
    async fn test_get_tracks_rejects_oversized_lookup() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let ids: Vec<TrackId> = (0..51).map(|i| TrackId::new(format!("t{}", i))).collect();
        let result = connector(mock_http).get_tracks(&ids).await;

        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_add_and_remove_send_track_uris() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Post);
                assert_eq!(
                    body_json(&req),
                    serde_json::json!({"uris": ["spotify:track:t1", "spotify:track:t2"]})
                );
                Ok(response(201, r#"{"snapshot_id":"s1"}"#))
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Delete);
                assert_eq!(
                    body_json(&req),
                    serde_json::json!({"tracks": [{"uri": "spotify:track:t3"}]})
                );
                Ok(response(200, r#"{"snapshot_id":"s2"}"#))
            });

        let connector = connector(mock_http);
        let playlist = PlaylistId::from("foo1");
        connector
            .add_tracks(&playlist, &[TrackId::from("t1"), TrackId::from("t2")])
            .await
            .unwrap();
        connector
            .remove_tracks(&playlist, &[TrackId::from("t3")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_mutation_sends_nothing() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let connector = connector(mock_http);
        connector
            .add_tracks(&PlaylistId::from("foo1"), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rate_limit_honours_retry_after() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                let mut limited = response(429, "");
                limited
                    .headers
                    .insert("retry-after".to_string(), "0".to_string());
                Ok(limited)
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, r#"{"id":"koenrh"}"#)));

        let user_id = connector(mock_http).current_user_id().await.unwrap();
        assert_eq!(user_id, "koenrh");
    }

    #[tokio::test]
    async fn test_mutation_server_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(502, "Bad Gateway")));

        let result = connector(mock_http)
            .add_tracks(&PlaylistId::from("foo1"), &[TrackId::from("t1")])
            .await;

        assert_eq!(result.unwrap_err().status(), Some(502));
    }

    #[tokio::test]
    async fn test_read_server_error_is_retried() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(503, "")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, r#"{"id":"koenrh"}"#)));

        assert_eq!(
            connector(mock_http).current_user_id().await.unwrap(),
            "koenrh"
        );
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                403,
                r#"{"error":{"status":403,"message":"Insufficient client scope"}}"#,
            ))
        });

        let result = connector(mock_http)
            .create_playlist("koenrh", NewPlaylist::private("st-liked", ""))
            .await;

        match result {
            Err(BridgeError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Insufficient client scope");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
