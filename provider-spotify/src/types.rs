//! Spotify Web API request and response types
//!
//! Only the fields the sync reads or writes are modelled.

use serde::{Deserialize, Serialize};

/// `GET /me`
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
}

/// Offset-paged collection wrapper.
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls#pagination
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    #[serde(default)]
    pub total: u32,

    /// URL of the next page; absent or null on the last page
    #[serde(default)]
    pub next: Option<String>,
}

/// Simplified playlist object as returned by playlist listing and creation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
}

/// Entry of a playlist's track listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackItem {
    /// Null for tracks that are no longer available
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// Track object; `id` is null for local files.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /tracks?ids=…`; entries are null for unknown IDs, in request order.
#[derive(Debug, Clone, Deserialize)]
pub struct SeveralTracksResponse {
    pub tracks: Vec<Option<TrackObject>>,
}

/// `POST /users/{user_id}/playlists`
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
    pub collaborative: bool,
}

/// `POST /playlists/{playlist_id}/tracks`
#[derive(Debug, Clone, Serialize)]
pub struct AddTracksBody {
    pub uris: Vec<String>,
}

/// `DELETE /playlists/{playlist_id}/tracks`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveTracksBody {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackUri {
    pub uri: String,
}

/// Error envelope: `{"error": {"status": 400, "message": "…"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub status: Option<u16>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_last_page_has_null_next() {
        let page: Paging<SimplifiedPlaylist> = serde_json::from_str(
            r#"{"items":[{"id":"p1","name":"st-liked","public":false}],"total":1,"next":null,"limit":50,"offset":0}"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 1);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_playlist_item_with_local_file() {
        let page: Paging<PlaylistTrackItem> = serde_json::from_str(
            r#"{"items":[{"track":{"id":null}},{"track":null},{"track":{"id":"t1"}}],"total":3}"#,
        )
        .unwrap();

        let ids: Vec<_> = page
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(|t| t.id))
            .collect();
        assert_eq!(ids, vec!["t1".to_string()]);
    }

    #[test]
    fn test_remove_body_shape() {
        let body = RemoveTracksBody {
            tracks: vec![TrackUri {
                uri: "spotify:track:t1".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"tracks":[{"uri":"spotify:track:t1"}]}"#
        );
    }
}
