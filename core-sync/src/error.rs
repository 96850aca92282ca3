use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures of a reconciliation run.
///
/// Missing tracks are not represented here: they are dropped from the add
/// set and reported, never returned as an error.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Playlist discovery failed: {0}")]
    Discovery(#[source] BridgeError),

    #[error("Track existence check failed: {0}")]
    ExistenceCheck(#[source] BridgeError),

    #[error("Failed to create playlist {name}: {source}")]
    PlaylistCreation {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error(
        "Mutation of playlist {playlist} failed after {applied_batches} applied batch(es): {source}"
    )]
    Mutation {
        playlist: String,
        applied_batches: usize,
        #[source]
        source: BridgeError,
    },

    #[error("Record store query for {bucket} failed: {source}")]
    RecordStore {
        bucket: String,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl SyncError {
    /// Whether the error may have left a playlist partially updated.
    pub fn is_partial_mutation(&self) -> bool {
        matches!(self, SyncError::Mutation { applied_batches, .. } if *applied_batches > 0)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
