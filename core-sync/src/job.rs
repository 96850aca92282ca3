//! # Playlist Sync State Machine
//!
//! Tracks a single playlist update through its steps with validated
//! transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → PlaylistResolved → ExistenceValidated → RemovalsApplied → AdditionsApplied → Done
//!   ↓            ↓                  ↓                    ↓                  ↓
//!   └────────────┴──────────────────┴──→ Failed ←────────┴──────────────────┘
//! ```

use bridge_traits::playlist::{PlaylistId, TrackId};
use std::fmt;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistSyncState {
    Idle,
    PlaylistResolved,
    ExistenceValidated,
    RemovalsApplied,
    AdditionsApplied,
    Done,
    Failed,
}

impl PlaylistSyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaylistSyncState::Done | PlaylistSyncState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistSyncState::Idle => "idle",
            PlaylistSyncState::PlaylistResolved => "playlist_resolved",
            PlaylistSyncState::ExistenceValidated => "existence_validated",
            PlaylistSyncState::RemovalsApplied => "removals_applied",
            PlaylistSyncState::AdditionsApplied => "additions_applied",
            PlaylistSyncState::Done => "done",
            PlaylistSyncState::Failed => "failed",
        }
    }

    fn next(&self) -> Option<PlaylistSyncState> {
        match self {
            PlaylistSyncState::Idle => Some(PlaylistSyncState::PlaylistResolved),
            PlaylistSyncState::PlaylistResolved => Some(PlaylistSyncState::ExistenceValidated),
            PlaylistSyncState::ExistenceValidated => Some(PlaylistSyncState::RemovalsApplied),
            PlaylistSyncState::RemovalsApplied => Some(PlaylistSyncState::AdditionsApplied),
            PlaylistSyncState::AdditionsApplied => Some(PlaylistSyncState::Done),
            PlaylistSyncState::Done | PlaylistSyncState::Failed => None,
        }
    }
}

impl fmt::Display for PlaylistSyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one playlist update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSyncReport {
    pub playlist_name: String,
    pub playlist_id: Option<PlaylistId>,
    pub created: bool,
    pub added: usize,
    pub removed: usize,
    /// Desired tracks the service reported as nonexistent
    pub missing: Vec<TrackId>,
}

/// One playlist update in progress.
#[derive(Debug, Clone)]
pub struct PlaylistSyncJob {
    state: PlaylistSyncState,
    report: PlaylistSyncReport,
}

impl PlaylistSyncJob {
    pub fn new(playlist_name: impl Into<String>) -> Self {
        Self {
            state: PlaylistSyncState::Idle,
            report: PlaylistSyncReport {
                playlist_name: playlist_name.into(),
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> PlaylistSyncState {
        self.state
    }

    pub fn report(&self) -> &PlaylistSyncReport {
        &self.report
    }

    pub fn resolved(&mut self, playlist_id: PlaylistId, created: bool) -> Result<()> {
        self.advance(PlaylistSyncState::PlaylistResolved)?;
        self.report.playlist_id = Some(playlist_id);
        self.report.created = created;
        Ok(())
    }

    pub fn validated(&mut self, missing: Vec<TrackId>) -> Result<()> {
        self.advance(PlaylistSyncState::ExistenceValidated)?;
        self.report.missing = missing;
        Ok(())
    }

    pub fn removals_applied(&mut self, removed: usize) -> Result<()> {
        self.advance(PlaylistSyncState::RemovalsApplied)?;
        self.report.removed = removed;
        Ok(())
    }

    pub fn additions_applied(&mut self, added: usize) -> Result<()> {
        self.advance(PlaylistSyncState::AdditionsApplied)?;
        self.report.added = added;
        Ok(())
    }

    pub fn complete(mut self) -> Result<PlaylistSyncReport> {
        self.advance(PlaylistSyncState::Done)?;
        Ok(self.report)
    }

    /// Any non-terminal state may fail.
    pub fn fail(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid(PlaylistSyncState::Failed));
        }
        self.state = PlaylistSyncState::Failed;
        Ok(())
    }

    fn advance(&mut self, to: PlaylistSyncState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(self.invalid(to));
        }
        self.state = to;
        Ok(())
    }

    fn invalid(&self, to: PlaylistSyncState) -> SyncError {
        SyncError::InvalidStateTransition {
            from: self.state.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut job = PlaylistSyncJob::new("st-liked");
        job.resolved(PlaylistId::from("p1"), true).unwrap();
        job.validated(vec![TrackId::from("gone")]).unwrap();
        job.removals_applied(1).unwrap();
        job.additions_applied(3).unwrap();
        assert_eq!(job.state(), PlaylistSyncState::AdditionsApplied);

        let report = job.complete().unwrap();
        assert_eq!(report.playlist_name, "st-liked");
        assert_eq!(report.playlist_id, Some(PlaylistId::from("p1")));
        assert!(report.created);
        assert_eq!(report.removed, 1);
        assert_eq!(report.added, 3);
        assert_eq!(report.missing, vec![TrackId::from("gone")]);
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut job = PlaylistSyncJob::new("st-liked");
        let result = job.removals_applied(0);

        assert!(matches!(
            result,
            Err(SyncError::InvalidStateTransition { ref from, ref to })
                if from == "idle" && to == "removals_applied"
        ));
        assert_eq!(job.state(), PlaylistSyncState::Idle);
    }

    #[test]
    fn test_any_step_can_fail_once() {
        let mut job = PlaylistSyncJob::new("st-loved");
        job.resolved(PlaylistId::from("p1"), false).unwrap();
        job.fail().unwrap();

        assert_eq!(job.state(), PlaylistSyncState::Failed);
        assert!(job.fail().is_err());
        assert!(job.validated(Vec::new()).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(PlaylistSyncState::Done.is_terminal());
        assert!(PlaylistSyncState::Failed.is_terminal());
        assert!(!PlaylistSyncState::RemovalsApplied.is_terminal());
        assert_eq!(PlaylistSyncState::ExistenceValidated.to_string(), "existence_validated");
    }
}
