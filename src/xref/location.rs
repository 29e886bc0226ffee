//! Resolution of reference ids to source locations.
//!
//! Each symbol the documentation tool knows about has its own XML document in
//! the output directory, named after the symbol's base id. The location of a
//! specific reference is recorded there as a `<location file="…" line="…"/>`
//! element nested directly under the element carrying the reference id.

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use quick_xml::{
    events::{attributes::AttrError, BytesStart, Event},
    Reader,
};

/// The source position a reference id resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The file containing the referencing symbol, as reported.
    pub file: String,
    /// The 1-based line number of the referencing symbol.
    pub line: NonZeroU32,
}

/// Errors raised while resolving a reference id.
///
/// Every reference must be traceable to exactly one source location, so all
/// of these are fatal to the linkage pass that triggered the resolution.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The reference id has no underscore-delimited suffix to strip, so no
    /// base symbol id can be derived.
    #[error("reference id '{0}' has no base symbol segment")]
    MalformedReferenceId(String),

    /// The symbol's own document could not be read or parsed.
    #[error("failed to read/parse symbol document {path}: {source}")]
    Read {
        /// The symbol document.
        path: PathBuf,
        /// The underlying XML error.
        source: quick_xml::Error,
    },

    /// An attribute in the symbol document could not be parsed.
    #[error("malformed attribute in symbol document {path}: {source}")]
    Attr {
        /// The symbol document.
        path: PathBuf,
        /// The underlying attribute error.
        source: AttrError,
    },

    /// The symbol document holds no location element for the reference id.
    #[error("missing location for reference '{refid}' in {path}")]
    MissingLocation {
        /// The unresolved reference id.
        refid: String,
        /// The symbol document searched.
        path: PathBuf,
    },

    /// The location element lacks its `file` attribute.
    #[error("missing file attribute on location for '{refid}' in {path}")]
    MissingFile {
        /// The reference id being resolved.
        refid: String,
        /// The symbol document.
        path: PathBuf,
    },

    /// The location element lacks its `line` attribute.
    #[error("missing line attribute on location for '{refid}' in {path}")]
    MissingLine {
        /// The reference id being resolved.
        refid: String,
        /// The symbol document.
        path: PathBuf,
    },

    /// The `line` attribute is not a positive integer.
    #[error("invalid line number '{value}' for reference '{refid}' in {path}")]
    InvalidLine {
        /// The reference id being resolved.
        refid: String,
        /// The symbol document.
        path: PathBuf,
        /// The offending attribute value.
        value: String,
    },
}

/// Resolves a reference id to the file and line of the referencing symbol.
///
/// The base symbol id is derived by stripping the final underscore-delimited
/// segment of `refid`; the symbol's document is `<output_dir>/<base>.xml`.
/// Resolution is a pure function of its inputs: repeated calls with the same
/// arguments yield the same result.
///
/// # Errors
///
/// Returns a [`LookupError`] if the symbol document cannot be read or parsed,
/// if it records no location for `refid`, or if the location is missing its
/// `file` or `line` attribute.
pub fn resolve(refid: &str, output_dir: &Path) -> Result<Location, LookupError> {
    let (base, _) = refid
        .rsplit_once('_')
        .ok_or_else(|| LookupError::MalformedReferenceId(refid.to_string()))?;
    let path = output_dir.join(format!("{base}.xml"));

    let mut reader = Reader::from_file(&path).map_err(|source| LookupError::Read {
        path: path.clone(),
        source,
    })?;
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    // Relative depth inside the element carrying the target id; `None` until
    // that element has been entered.
    let mut symbol_depth: Option<usize> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| LookupError::Read {
                path: path.clone(),
                source,
            })?;

        match event {
            Event::Start(element) => {
                if let Some(depth) = symbol_depth.as_mut() {
                    if *depth == 0 && element.name().as_ref() == b"location" {
                        return read_location(&element, refid, &path);
                    }
                    *depth += 1;
                } else if attribute(&element, "id", &path)?.as_deref() == Some(refid) {
                    symbol_depth = Some(0);
                }
            }
            Event::Empty(element) => {
                if symbol_depth == Some(0) && element.name().as_ref() == b"location" {
                    return read_location(&element, refid, &path);
                }
            }
            Event::End(_) => {
                if let Some(depth) = symbol_depth.as_mut() {
                    if *depth == 0 {
                        // The symbol element closed without a location child.
                        break;
                    }
                    *depth -= 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(LookupError::MissingLocation {
        refid: refid.to_string(),
        path,
    })
}

fn read_location(
    element: &BytesStart<'_>,
    refid: &str,
    path: &Path,
) -> Result<Location, LookupError> {
    let file = attribute(element, "file", path)?.ok_or_else(|| LookupError::MissingFile {
        refid: refid.to_string(),
        path: path.to_path_buf(),
    })?;

    let line = attribute(element, "line", path)?.ok_or_else(|| LookupError::MissingLine {
        refid: refid.to_string(),
        path: path.to_path_buf(),
    })?;

    let line = line
        .parse::<NonZeroU32>()
        .map_err(|_| LookupError::InvalidLine {
            refid: refid.to_string(),
            path: path.to_path_buf(),
            value: line,
        })?;

    Ok(Location { file, line })
}

fn attribute(
    element: &BytesStart<'_>,
    name: &str,
    path: &Path,
) -> Result<Option<String>, LookupError> {
    element
        .try_get_attribute(name)
        .map_err(|source| LookupError::Attr {
            path: path.to_path_buf(),
            source,
        })?
        .map(|attribute| {
            attribute
                .unescape_value()
                .map(|value| value.into_owned())
                .map_err(|source| LookupError::Read {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .transpose()
}
