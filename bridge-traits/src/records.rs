//! Record Store Abstraction
//!
//! Read-only query surface over the tabular store that holds the source of
//! truth for which tracks belong in which bucket.

use async_trait::async_trait;

use crate::error::Result;
use crate::playlist::TrackId;

/// Filtered projection over a table of track records.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::records::RecordStore;
///
/// async fn liked(store: &dyn RecordStore) -> Result<Vec<TrackId>> {
///     store.list_track_ids("Tracks", "{Like} = 1").await
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return one track identifier per record in `table` matching `filter`.
    ///
    /// Order follows the store's own record order.
    async fn list_track_ids(&self, table: &str, filter: &str) -> Result<Vec<TrackId>>;
}
