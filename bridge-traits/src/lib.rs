//! # Host Bridge Traits
//!
//! Capability seams between the reconciliation core and the outside world.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync core and concrete
//! adapters. Each trait represents a capability the core requires but which
//! is implemented elsewhere: by a desktop adapter, a provider crate, or an
//! in-memory fake in tests.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//! - [`BrowserLauncher`](browser::BrowserLauncher) - Open the authorization URL for the user
//! - [`PlaylistService`](playlist::PlaylistService) - Remote playlist discovery and mutation
//! - [`RecordStore`](records::RecordStore) - Filtered track lookups in the tabular record store
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Implementations should:
//!
//! - Convert provider-specific errors to `BridgeError`
//! - Preserve HTTP status codes via `BridgeError::Api`
//! - Surface rate limiting as `BridgeError::RateLimited`
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared behind
//! `Arc` across async tasks.

pub mod browser;
pub mod error;
pub mod http;
pub mod playlist;
pub mod records;

pub use browser::{BrowserLauncher, NoopBrowser};
pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playlist::{
    NewPlaylist, Page, PageRequest, PlaylistId, PlaylistService, PlaylistSummary, TrackId,
};
pub use records::RecordStore;
