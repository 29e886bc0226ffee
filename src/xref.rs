//! Ingestion of Doxygen-generated cross-reference XML.
//!
//! The documentation tool annotates source and test trees with requirement
//! references embedded in comments, and emits one cross-reference document
//! per scanned directory. This module turns those documents into deduplicated
//! link evidence in the [`Repository`](crate::domain::Repository).

/// Location resolution for reference ids.
pub mod location;
pub use location::{resolve, Location, LookupError};

/// The linkage pass over one cross-reference document.
pub mod parser;
pub use parser::{run_pass, ParseError, PassError, PassOutcome, LINK_DOCUMENT};

/// Discovery of cross-reference documents beneath an output root.
pub mod scan;
pub use scan::link_directories;
