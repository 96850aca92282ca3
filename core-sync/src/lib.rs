//! # Sync & Reconciliation Module
//!
//! Makes managed remote playlists match the track sets selected from the
//! record store.
//!
//! ## Overview
//!
//! For every bucket (each year, each decade, liked, loved) the driver asks
//! the record store for the desired track IDs and reconciles the bucket's
//! playlist against them:
//! - Discovering existing managed playlists once per run
//! - Creating missing playlists
//! - Dropping desired tracks the playlist service no longer knows
//! - Removing stale tracks and adding missing ones in bounded batches
//!
//! ## Components
//!
//! - **Remote State Cache** (`cache`): Lazily populated snapshot of managed playlists
//! - **Reconciliation** (`reconcile`): Playlist resolution and add/remove deltas
//! - **Batch Executor** (`executor`): Chunked existence checks and mutations
//! - **Playlist Sync State Machine** (`job`): Validated per-playlist step transitions
//! - **Buckets** (`bucket`): Playlist names and record store filters
//! - **Sync Engine** (`engine`): One playlist update end to end
//! - **Sync Driver** (`driver`): The whole run, bucket by bucket

pub mod bucket;
pub mod cache;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod job;
pub mod reconcile;

pub use bucket::Bucket;
pub use cache::RemoteStateCache;
pub use driver::{SyncDriver, SyncSummary};
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use executor::{BatchExecutor, ExistenceReport};
pub use job::{PlaylistSyncJob, PlaylistSyncReport, PlaylistSyncState};
pub use reconcile::{compute_delta, find_or_create_playlist, Delta, ResolvedPlaylist};
