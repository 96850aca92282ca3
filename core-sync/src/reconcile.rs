//! Playlist resolution and delta computation.

use bridge_traits::playlist::{NewPlaylist, PlaylistId, PlaylistService, TrackId};
use core_runtime::logging::AUDIT_TARGET;
use std::collections::HashSet;
use tracing::info;

use crate::cache::RemoteStateCache;
use crate::error::{Result, SyncError};

/// Tracks to add to and remove from one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Desired tracks missing remotely, in desired order
    pub to_add: Vec<TrackId>,
    /// Remote tracks no longer desired, in remote order
    pub to_remove: Vec<TrackId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compare current membership against the desired tracks.
pub fn compute_delta(current: &[TrackId], desired: &[TrackId]) -> Delta {
    let desired_set: HashSet<&TrackId> = desired.iter().collect();
    let current_set: HashSet<&TrackId> = current.iter().collect();

    Delta {
        to_add: desired
            .iter()
            .filter(|id| !current_set.contains(id))
            .cloned()
            .collect(),
        to_remove: current
            .iter()
            .filter(|id| !desired_set.contains(id))
            .cloned()
            .collect(),
    }
}

/// A playlist looked up by name, possibly created on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    pub id: PlaylistId,
    pub created: bool,
}

/// Look `name` up in the cache, creating a private playlist when absent.
///
/// The created playlist is registered in the cache, so resolving the same
/// name again in this run returns it instead of creating another.
pub async fn find_or_create_playlist(
    cache: &mut RemoteStateCache,
    service: &dyn PlaylistService,
    user_id: &str,
    name: &str,
    description: &str,
) -> Result<ResolvedPlaylist> {
    cache.ensure_populated(service, user_id).await?;

    if let Some(id) = cache.playlist_id(name) {
        return Ok(ResolvedPlaylist {
            id: id.clone(),
            created: false,
        });
    }

    let created = service
        .create_playlist(user_id, NewPlaylist::private(name, description))
        .await
        .map_err(|source| SyncError::PlaylistCreation {
            name: name.to_string(),
            source,
        })?;

    info!(target: AUDIT_TARGET, "create spotify:playlist:{} ({})", created.id, name);
    cache.record_created(name, created.id.clone());

    Ok(ResolvedPlaylist {
        id: created.id,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<TrackId> {
        values.iter().map(|v| TrackId::from(*v)).collect()
    }

    #[test]
    fn test_delta_adds_missing_and_removes_stale() {
        let delta = compute_delta(&ids(&["B", "C", "D"]), &ids(&["A", "B", "C"]));

        assert_eq!(delta.to_add, ids(&["A"]));
        assert_eq!(delta.to_remove, ids(&["D"]));
    }

    #[test]
    fn test_delta_preserves_iteration_order() {
        let delta = compute_delta(&ids(&["z", "x", "y"]), &ids(&["c", "a", "b"]));

        assert_eq!(delta.to_add, ids(&["c", "a", "b"]));
        assert_eq!(delta.to_remove, ids(&["z", "x", "y"]));
    }

    #[test]
    fn test_delta_of_identical_sets_is_empty() {
        let delta = compute_delta(&ids(&["a", "b"]), &ids(&["b", "a"]));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_delta_is_case_sensitive() {
        let delta = compute_delta(&ids(&["abc"]), &ids(&["ABC"]));
        assert_eq!(delta.to_add, ids(&["ABC"]));
        assert_eq!(delta.to_remove, ids(&["abc"]));
    }
}
