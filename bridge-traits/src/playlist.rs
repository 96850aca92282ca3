//! Playlist Service Abstraction
//!
//! The narrow capability surface the reconciliation engine needs from a
//! remote playlist service: paginated discovery, playlist creation, track
//! existence checks and batched membership mutation.
//!
//! Implementations live in provider crates (e.g. `provider-spotify`); tests
//! use in-memory fakes implementing the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque track identifier in the remote catalog.
///
/// Equality is exact string match; no normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque playlist identifier assigned by the remote service at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A playlist as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
}

/// Offset-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// Request for the page following this one.
    pub fn advance(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items the service reports for the whole listing
    pub total: u32,
    /// Cursor for the next page; `None` when the service reports no more pages
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Whether another page should be requested at `next_offset`.
    ///
    /// Stops on an empty next-page cursor or once the offset reaches the
    /// declared total, whichever comes first.
    pub fn has_more(&self, next_offset: u32) -> bool {
        let cursor_present = self.next.as_deref().is_some_and(|next| !next.is_empty());
        cursor_present && next_offset < self.total
    }
}

/// Parameters for creating a playlist owned by the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

impl NewPlaylist {
    /// Private, non-collaborative playlist.
    pub fn private(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            public: false,
            collaborative: false,
        }
    }
}

/// Remote playlist service capability.
///
/// All list operations are offset-paginated; per-call item ceilings are the
/// responsibility of the caller.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Identifier of the authenticated user.
    async fn current_user_id(&self) -> Result<String>;

    /// One page of playlists belonging to `user_id`.
    async fn list_user_playlists(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Page<PlaylistSummary>>;

    /// One page of track membership for a playlist, in playlist order.
    async fn list_playlist_tracks(
        &self,
        playlist_id: &PlaylistId,
        page: PageRequest,
    ) -> Result<Page<TrackId>>;

    /// Create a playlist for `user_id` and return it.
    async fn create_playlist(&self, user_id: &str, playlist: NewPlaylist)
        -> Result<PlaylistSummary>;

    /// Look up several tracks at once.
    ///
    /// Returns exactly one entry per requested ID, in request order; `None`
    /// marks a track the catalog no longer knows.
    async fn get_tracks(&self, track_ids: &[TrackId]) -> Result<Vec<Option<TrackId>>>;

    /// Append tracks to a playlist.
    async fn add_tracks(&self, playlist_id: &PlaylistId, track_ids: &[TrackId]) -> Result<()>;

    /// Remove every occurrence of the given tracks from a playlist.
    async fn remove_tracks(&self, playlist_id: &PlaylistId, track_ids: &[TrackId])
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: u32, next: Option<&str>) -> Page<TrackId> {
        Page {
            items: vec![],
            total,
            next: next.map(str::to_string),
        }
    }

    #[test]
    fn test_has_more_requires_cursor_and_remaining_items() {
        assert!(page(250, Some("next")).has_more(100));
        assert!(!page(250, None).has_more(100));
        assert!(!page(250, Some("")).has_more(100));
        // Cursor present but offset already past the declared total
        assert!(!page(100, Some("next")).has_more(100));
    }

    #[test]
    fn test_page_request_advance() {
        let request = PageRequest::first(50).advance().advance();
        assert_eq!(request, PageRequest { limit: 50, offset: 100 });
    }

    #[test]
    fn test_track_id_exact_equality() {
        assert_eq!(TrackId::from("abc"), TrackId::new("abc".to_string()));
        assert_ne!(TrackId::from("abc"), TrackId::from("ABC"));
        assert_eq!(TrackId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_new_playlist_private_defaults() {
        let playlist = NewPlaylist::private("st-liked", "Managed by Spotitable");
        assert!(!playlist.public);
        assert!(!playlist.collaborative);
    }

    #[test]
    fn test_track_id_serializes_transparently() {
        let json = serde_json::to_string(&TrackId::from("4uLU6hMCjMI75M1A2tKUQC")).unwrap();
        assert_eq!(json, "\"4uLU6hMCjMI75M1A2tKUQC\"");
    }
}
