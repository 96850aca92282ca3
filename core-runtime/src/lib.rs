//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for a sync run:
//! - Logging and tracing infrastructure
//! - Configuration management (run settings and environment credentials)
//!
//! ## Overview
//!
//! This crate contains the ambient utilities the other workspace crates
//! depend on. It establishes the logging conventions (including the audit
//! target for change records) and the validated configuration a run starts
//! from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Credentials, FailurePolicy, SyncConfig, SyncConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig, AUDIT_TARGET};
