//! # Airtable Provider
//!
//! Implements `RecordStore` for the Airtable REST API.
//!
//! The store is read-only from the sync's point of view: each query is a
//! filter formula over the track table, answered with the Spotify track ID
//! of every matching record.

pub mod connector;
pub mod error;
pub mod formula;
pub mod types;

pub use connector::{AirtableConnector, SPOTIFY_ID_FIELD};
pub use error::{AirtableError, Result};
