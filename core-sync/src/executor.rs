//! # Batch Mutation Executor
//!
//! Splits existence checks and membership mutations into requests that fit
//! the playlist service's per-call ceilings and issues them in order.
//!
//! Mutations are not transactional: when a chunk fails, the chunks before it
//! stay applied and the rest are skipped. Re-running the reconciliation
//! converges because the next delta is computed against the partial state.

use bridge_traits::playlist::{PlaylistId, PlaylistService, TrackId};
use core_runtime::logging::AUDIT_TARGET;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};

/// Track IDs per existence lookup.
pub const DEFAULT_LOOKUP_CEILING: usize = 50;

/// Track IDs per add or remove request.
pub const DEFAULT_MUTATION_CEILING: usize = 100;

/// Outcome of an existence check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistenceReport {
    /// Confirmed tracks, in input order
    pub existing: Vec<TrackId>,
    /// Tracks the service does not know, in input order
    pub missing: Vec<TrackId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct BatchExecutor {
    lookup_ceiling: usize,
    mutation_ceiling: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_CEILING, DEFAULT_MUTATION_CEILING)
    }
}

impl BatchExecutor {
    pub fn new(lookup_ceiling: usize, mutation_ceiling: usize) -> Self {
        Self {
            lookup_ceiling: lookup_ceiling.max(1),
            mutation_ceiling: mutation_ceiling.max(1),
        }
    }

    /// Split `track_ids` into confirmed and missing tracks.
    ///
    /// Missing tracks are reported and dropped; only a failed lookup call is
    /// an error.
    pub async fn validate_existence(
        &self,
        service: &dyn PlaylistService,
        track_ids: &[TrackId],
    ) -> Result<ExistenceReport> {
        let mut report = ExistenceReport::default();

        for chunk in track_ids.chunks(self.lookup_ceiling) {
            let found = service
                .get_tracks(chunk)
                .await
                .map_err(SyncError::ExistenceCheck)?;

            for (index, requested) in chunk.iter().enumerate() {
                match found.get(index) {
                    Some(Some(_)) => report.existing.push(requested.clone()),
                    _ => {
                        warn!(target: AUDIT_TARGET, "spotify:track:{} does not exist", requested);
                        report.missing.push(requested.clone());
                    }
                }
            }
        }

        debug!(
            existing = report.existing.len(),
            missing = report.missing.len(),
            "Validated track existence"
        );
        Ok(report)
    }

    /// Remove `track_ids` from the playlist. Returns the number of requests sent.
    pub async fn apply_removals(
        &self,
        service: &dyn PlaylistService,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
    ) -> Result<usize> {
        self.apply(service, playlist_id, track_ids, Mutation::Remove)
            .await
    }

    /// Add `track_ids` to the playlist. Returns the number of requests sent.
    pub async fn apply_additions(
        &self,
        service: &dyn PlaylistService,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
    ) -> Result<usize> {
        self.apply(service, playlist_id, track_ids, Mutation::Add)
            .await
    }

    async fn apply(
        &self,
        service: &dyn PlaylistService,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
        mutation: Mutation,
    ) -> Result<usize> {
        let mut applied = 0;

        for chunk in track_ids.chunks(self.mutation_ceiling) {
            let result = match mutation {
                Mutation::Add => service.add_tracks(playlist_id, chunk).await,
                Mutation::Remove => service.remove_tracks(playlist_id, chunk).await,
            };

            if let Err(source) = result {
                warn!(
                    playlist = %playlist_id,
                    applied_batches = applied,
                    "Batch {:?} failed, skipping remaining batches",
                    mutation
                );
                return Err(SyncError::Mutation {
                    playlist: playlist_id.to_string(),
                    applied_batches: applied,
                    source,
                });
            }
            applied += 1;

            for track_id in chunk {
                match mutation {
                    Mutation::Add => info!(
                        target: AUDIT_TARGET,
                        "add spotify:track:{} to spotify:playlist:{}", track_id, playlist_id
                    ),
                    Mutation::Remove => info!(
                        target: AUDIT_TARGET,
                        "remove spotify:track:{} from spotify:playlist:{}", track_id, playlist_id
                    ),
                }
            }
        }

        Ok(applied)
    }
}
