//! # Sync Driver
//!
//! Walks every bucket in order, asks the record store for the bucket's
//! tracks and hands them to the [`SyncEngine`]. Buckets are processed one at
//! a time so no playlist is ever mutated concurrently.

use bridge_traits::records::RecordStore;
use core_runtime::config::{FailurePolicy, SyncConfig};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::bucket::Bucket;
use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};
use crate::job::PlaylistSyncReport;

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub buckets_processed: usize,
    pub buckets_skipped_empty: usize,
    pub buckets_failed: usize,
    pub playlists_created: usize,
    pub tracks_added: usize,
    pub tracks_removed: usize,
    pub tracks_missing: usize,
}

impl SyncSummary {
    fn record(&mut self, report: &PlaylistSyncReport) {
        self.buckets_processed += 1;
        if report.created {
            self.playlists_created += 1;
        }
        self.tracks_added += report.added;
        self.tracks_removed += report.removed;
        self.tracks_missing += report.missing.len();
    }

    pub fn is_clean(&self) -> bool {
        self.buckets_failed == 0
    }
}

pub struct SyncDriver {
    engine: SyncEngine,
    records: Arc<dyn RecordStore>,
    config: SyncConfig,
}

impl SyncDriver {
    pub fn new(engine: SyncEngine, records: Arc<dyn RecordStore>, config: SyncConfig) -> Self {
        Self {
            engine,
            records,
            config,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Buckets this run will visit.
    pub fn buckets(&self) -> Vec<Bucket> {
        Bucket::all(
            self.config.epoch,
            self.config.current_year,
            self.config.decade_years,
        )
    }

    /// Run every bucket.
    ///
    /// With [`FailurePolicy::Abort`] the first failing bucket ends the run
    /// and its error is returned. With [`FailurePolicy::Continue`] failures
    /// are logged and counted in the summary.
    #[instrument(skip(self), fields(table = %self.config.table))]
    pub async fn run(&mut self) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for bucket in self.buckets() {
            match self.sync_bucket(bucket).await {
                Ok(Some(report)) => summary.record(&report),
                Ok(None) => summary.buckets_skipped_empty += 1,
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => {
                        error!(bucket = %bucket, error = %e, "Bucket failed, continuing");
                        summary.buckets_failed += 1;
                    }
                },
            }
        }

        info!(
            processed = summary.buckets_processed,
            skipped = summary.buckets_skipped_empty,
            failed = summary.buckets_failed,
            created = summary.playlists_created,
            added = summary.tracks_added,
            removed = summary.tracks_removed,
            missing = summary.tracks_missing,
            "Sync finished"
        );
        Ok(summary)
    }

    async fn sync_bucket(&mut self, bucket: Bucket) -> Result<Option<PlaylistSyncReport>> {
        let desired = self
            .records
            .list_track_ids(&self.config.table, &bucket.filter())
            .await
            .map_err(|source| SyncError::RecordStore {
                bucket: bucket.to_string(),
                source,
            })?;

        debug!(bucket = %bucket, tracks = desired.len(), "Fetched desired tracks");

        let name = bucket.playlist_name(&self.config.playlist_prefix);
        self.engine
            .add_tracks_to_named_playlist(&name, desired)
            .await
    }
}
