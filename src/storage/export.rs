//! Reading requirement module exports.
//!
//! The requirements database exports one CSV file per module. Each row names
//! a requirement and carries its statement text; the columns of interest are
//! identified by header. A schema violation here is fatal to the whole run,
//! because a requirement map built from a malformed export cannot be
//! trusted.

use std::path::{Path, PathBuf};

use crate::domain::ExportRow;

/// Header of the column holding requirement names.
const COLUMN_NAME: &str = "ID";

/// Header of the column holding requirement statement text.
const COLUMN_TEXT: &str = "SW Requirements";

/// Errors raised while reading module export data.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No requirement modules were specified for the run.
    #[error("no requirement modules specified")]
    NoModules,

    /// The export file could not be read or is not well-formed CSV.
    #[error("unable to read module export {path}: {source}")]
    Read {
        /// The export file.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// A required column header is absent from the export.
    #[error("expected column '{column}' in module export {path}")]
    MissingColumn {
        /// The export file.
        path: PathBuf,
        /// The missing column header.
        column: &'static str,
    },
}

/// Reads the rows of one module export.
///
/// Rows are returned in file order, names and text exactly as exported.
///
/// # Errors
///
/// Returns a [`SchemaError`] if the file cannot be read, is not well-formed
/// CSV, or lacks the `ID` or `SW Requirements` column.
pub fn read_module(path: &Path) -> Result<Vec<ExportRow>, SchemaError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let column_index = |column: &'static str| {
        headers
            .iter()
            .position(|header| header == column)
            .ok_or(SchemaError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
    };

    let name_index = column_index(COLUMN_NAME)?;
    let text_index = column_index(COLUMN_TEXT)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        rows.push(ExportRow {
            name: record.get(name_index).unwrap_or_default().to_string(),
            text: record.get(text_index).unwrap_or_default().to_string(),
        });
    }

    Ok(rows)
}
