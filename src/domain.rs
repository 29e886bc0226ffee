//! Domain models for requirement traceability.
//!
//! This module contains the core domain types: link evidence, requirements,
//! the two-level requirement repository, and run configuration.

mod config;
pub use config::{Config, ConfigError};

/// Link evidence types.
pub mod link;
pub use link::{Link, LinkKind};

/// Requirement entries and their link sets.
pub mod requirement;
pub use requirement::Requirement;

/// The module → requirement → entry map.
pub mod repository;
pub use repository::{ExportRow, LinkOutcome, Module, Repository};
