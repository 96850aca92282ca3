//! Reconciliation of one named playlist against a desired track list.

use bridge_traits::playlist::{PlaylistService, TrackId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::cache::RemoteStateCache;
use crate::error::Result;
use crate::executor::BatchExecutor;
use crate::job::{PlaylistSyncJob, PlaylistSyncReport};
use crate::reconcile::{compute_delta, find_or_create_playlist};

/// Owns the run's remote snapshot and applies per-playlist updates.
pub struct SyncEngine {
    service: Arc<dyn PlaylistService>,
    user_id: String,
    cache: RemoteStateCache,
    executor: BatchExecutor,
    description: String,
    dedupe_desired: bool,
}

impl SyncEngine {
    pub fn new(
        service: Arc<dyn PlaylistService>,
        user_id: impl Into<String>,
        cache: RemoteStateCache,
    ) -> Self {
        Self {
            service,
            user_id: user_id.into(),
            cache,
            executor: BatchExecutor::default(),
            description: String::new(),
            dedupe_desired: true,
        }
    }

    pub fn with_executor(mut self, executor: BatchExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Description given to playlists created by this engine.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Drop repeated desired IDs, keeping the first occurrence.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe_desired = dedupe;
        self
    }

    pub fn cache(&self) -> &RemoteStateCache {
        &self.cache
    }

    /// Make the playlist called `name` contain exactly the existing tracks of
    /// `desired`.
    ///
    /// An empty `desired` is a no-op: no playlist is created and nothing is
    /// mutated, so `Ok(None)` is returned.
    #[instrument(skip(self, desired), fields(desired = desired.len()))]
    pub async fn add_tracks_to_named_playlist(
        &mut self,
        name: &str,
        desired: Vec<TrackId>,
    ) -> Result<Option<PlaylistSyncReport>> {
        if desired.is_empty() {
            debug!("No desired tracks, leaving playlist untouched");
            return Ok(None);
        }

        let desired = if self.dedupe_desired {
            dedupe(desired)
        } else {
            desired
        };

        let mut job = PlaylistSyncJob::new(name);
        match self.update(&mut job, name, &desired).await {
            Ok(()) => {
                let report = job.complete()?;
                info!(
                    playlist = %name,
                    added = report.added,
                    removed = report.removed,
                    missing = report.missing.len(),
                    "Playlist up to date"
                );
                Ok(Some(report))
            }
            Err(e) => {
                job.fail()?;
                Err(e)
            }
        }
    }

    async fn update(
        &mut self,
        job: &mut PlaylistSyncJob,
        name: &str,
        desired: &[TrackId],
    ) -> Result<()> {
        let service = self.service.as_ref();

        let resolved = find_or_create_playlist(
            &mut self.cache,
            service,
            &self.user_id,
            name,
            &self.description,
        )
        .await?;
        job.resolved(resolved.id.clone(), resolved.created)?;

        let existence = self.executor.validate_existence(service, desired).await?;
        job.validated(existence.missing)?;

        let delta = compute_delta(self.cache.tracks(&resolved.id), &existence.existing);

        self.executor
            .apply_removals(service, &resolved.id, &delta.to_remove)
            .await?;
        job.removals_applied(delta.to_remove.len())?;

        self.executor
            .apply_additions(service, &resolved.id, &delta.to_add)
            .await?;
        job.additions_applied(delta.to_add.len())?;

        // Optimistic: the remote playlist now holds the validated desired set.
        self.cache.set_tracks(&resolved.id, existence.existing);
        Ok(())
    }
}

fn dedupe(track_ids: Vec<TrackId>) -> Vec<TrackId> {
    let mut seen = HashSet::with_capacity(track_ids.len());
    track_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let ids = ["b", "a", "b", "c", "a"]
            .iter()
            .map(|id| TrackId::from(*id))
            .collect();

        assert_eq!(
            dedupe(ids),
            vec![TrackId::from("b"), TrackId::from("a"), TrackId::from("c")]
        );
    }
}
