//! Rendering of the enriched repository and derived coverage numbers.

/// Plain-text listing of unlinked requirements.
pub mod gap;
pub use gap::write_gap_report;

/// Build-server summary table.
pub mod summary;
pub use summary::write_summary;
