//! Reading of external inputs: requirement module exports.

/// CSV module export reader.
pub mod export;
pub use export::{read_module, SchemaError};
