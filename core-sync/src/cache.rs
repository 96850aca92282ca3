//! # Remote State Cache
//!
//! In-memory snapshot of the managed playlists and their membership.
//!
//! The snapshot is populated lazily on first use, once per run, by paging
//! through every playlist of the user and keeping only those whose name
//! carries the managed prefix. It is never re-fetched mid-run; successful
//! mutations are folded back in optimistically through
//! [`RemoteStateCache::set_tracks`].

use bridge_traits::playlist::{Page, PageRequest, PlaylistId, PlaylistService, TrackId};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};

/// Playlists per listing page (service ceiling).
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Tracks per playlist listing page (service ceiling).
pub const TRACK_PAGE_SIZE: u32 = 100;

#[derive(Debug)]
pub struct RemoteStateCache {
    prefix: String,
    playlist_page_size: u32,
    track_page_size: u32,
    populated: bool,
    playlists: HashMap<String, PlaylistId>,
    tracks: HashMap<PlaylistId, Vec<TrackId>>,
}

impl RemoteStateCache {
    /// Cache of playlists whose name starts with `managed_prefix` (e.g. `st-`).
    pub fn new(managed_prefix: impl Into<String>) -> Self {
        Self {
            prefix: managed_prefix.into(),
            playlist_page_size: PLAYLIST_PAGE_SIZE,
            track_page_size: TRACK_PAGE_SIZE,
            populated: false,
            playlists: HashMap::new(),
            tracks: HashMap::new(),
        }
    }

    pub fn with_page_sizes(mut self, playlists: u32, tracks: u32) -> Self {
        self.playlist_page_size = playlists.max(1);
        self.track_page_size = tracks.max(1);
        self
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn is_managed(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    pub fn playlist_id(&self, name: &str) -> Option<&PlaylistId> {
        self.playlists.get(name)
    }

    /// Cached membership of `playlist_id`, in remote order.
    pub fn tracks(&self, playlist_id: &PlaylistId) -> &[TrackId] {
        self.tracks
            .get(playlist_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    /// Load every managed playlist and its tracks, unless already loaded.
    ///
    /// On any page error nothing is retained and the cache stays
    /// unpopulated, so a later call starts over.
    #[instrument(skip(self, service))]
    pub async fn ensure_populated(
        &mut self,
        service: &dyn PlaylistService,
        user_id: &str,
    ) -> Result<()> {
        if self.populated {
            return Ok(());
        }

        let mut playlists: HashMap<String, PlaylistId> = HashMap::new();
        let mut tracks: HashMap<PlaylistId, Vec<TrackId>> = HashMap::new();
        let mut request = PageRequest::first(self.playlist_page_size);

        loop {
            let page = service
                .list_user_playlists(user_id, request)
                .await
                .map_err(SyncError::Discovery)?;
            request = request.advance();

            for playlist in &page.items {
                if !self.is_managed(&playlist.name) {
                    continue;
                }
                if let Some(kept) = playlists.get(&playlist.name) {
                    debug!(
                        name = %playlist.name,
                        kept = %kept,
                        ignored = %playlist.id,
                        "Duplicate managed playlist name, keeping the first"
                    );
                    continue;
                }

                let membership = self.fetch_tracks(service, &playlist.id).await?;
                playlists.insert(playlist.name.clone(), playlist.id.clone());
                tracks.insert(playlist.id.clone(), membership);
            }

            if !page.has_more(request.offset) {
                break;
            }
        }

        info!(
            "Found {} managed playlist(s) with prefix {}",
            playlists.len(),
            self.prefix
        );

        self.playlists = playlists;
        self.tracks = tracks;
        self.populated = true;
        Ok(())
    }

    async fn fetch_tracks(
        &self,
        service: &dyn PlaylistService,
        playlist_id: &PlaylistId,
    ) -> Result<Vec<TrackId>> {
        let mut membership = Vec::new();
        let mut request = PageRequest::first(self.track_page_size);

        loop {
            let page: Page<TrackId> = service
                .list_playlist_tracks(playlist_id, request)
                .await
                .map_err(SyncError::Discovery)?;
            request = request.advance();

            let more = page.has_more(request.offset);
            membership.extend(page.items);
            if !more {
                break;
            }
        }

        debug!(playlist = %playlist_id, tracks = membership.len(), "Loaded playlist tracks");
        Ok(membership)
    }

    /// Register a playlist created during this run with empty membership.
    pub fn record_created(&mut self, name: impl Into<String>, playlist_id: PlaylistId) {
        self.tracks.entry(playlist_id.clone()).or_default();
        self.playlists.entry(name.into()).or_insert(playlist_id);
    }

    /// Replace the cached membership after a successful update.
    pub fn set_tracks(&mut self, playlist_id: &PlaylistId, membership: Vec<TrackId>) {
        self.tracks.insert(playlist_id.clone(), membership);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_created_keeps_first_mapping() {
        let mut cache = RemoteStateCache::new("st-");
        cache.record_created("st-liked", PlaylistId::from("p1"));
        cache.record_created("st-liked", PlaylistId::from("p2"));

        assert_eq!(cache.playlist_id("st-liked"), Some(&PlaylistId::from("p1")));
        assert!(cache.tracks(&PlaylistId::from("p1")).is_empty());
    }

    #[test]
    fn test_unknown_playlist_has_no_tracks() {
        let cache = RemoteStateCache::new("st-");
        assert!(cache.tracks(&PlaylistId::from("nope")).is_empty());
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_prefix_match() {
        let cache = RemoteStateCache::new("st-");
        assert!(cache.is_managed("st-year-1999"));
        assert!(!cache.is_managed("st"));
        assert!(!cache.is_managed("best-of"));
        assert!(!cache.is_managed("ST-liked"));
    }
}
