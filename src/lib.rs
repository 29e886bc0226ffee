//! Requirement-to-code traceability.
//!
//! Requirement modules are loaded from database exports, enriched with link
//! evidence mined from documentation-tool cross-reference XML, and reduced to
//! per-module coverage numbers and reports.

pub mod domain;
pub use domain::{Config, ConfigError, Link, LinkKind, Repository, Requirement};

/// Warning accumulation for one run.
pub mod diagnostics;
pub use diagnostics::{Diagnostics, Warning};

/// Reading of module export data.
pub mod storage;
pub use storage::SchemaError;

/// Cross-reference XML ingestion.
pub mod xref;
pub use xref::{LookupError, ParseError, PassError, PassOutcome};

/// Coverage aggregation.
pub mod coverage;
pub use coverage::{CoverageReport, CoverageStats};

/// Report rendering.
pub mod render;

/// Run orchestration.
pub mod engine;
pub use engine::{Engine, PassFailure};
