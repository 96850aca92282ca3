//! # Spotify Provider
//!
//! Implements `PlaylistService` for the Spotify Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - Offset pagination over the user's playlists and a playlist's tracks
//! - Playlist creation
//! - Track existence lookups
//! - Batched track additions and removals
//! - `Retry-After` aware rate limiting and backoff on server errors

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{
    SpotifyConnector, MAX_PLAYLISTS_PER_PAGE, MAX_PLAYLIST_TRACKS, MAX_TRACKS_PER_LOOKUP,
};
pub use error::{Result, SpotifyError};
