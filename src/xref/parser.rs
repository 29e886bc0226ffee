//! The linkage pass: extraction of requirement links from one
//! cross-reference document.
//!
//! The document contains a sequence of link-list sections, each a flat
//! sequence of paired nodes: a `varlistentry` immediately followed by a
//! `listitem`. The entry names the referencing symbol and carries a `ref`
//! node with a reference id and kind; the item enumerates the requirement
//! names linked from that symbol. Parsing is two-phase: the whole document is
//! reduced to a list of evidence first, and the repository is only touched
//! once the document has parsed cleanly, so a failed pass leaves the
//! repository exactly as it was.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use quick_xml::{
    events::{attributes::AttrError, BytesStart, Event},
    Reader,
};

use crate::{
    diagnostics::{Diagnostics, Warning},
    domain::{Link, LinkKind, LinkOutcome, Repository},
    xref::location::{self, LookupError},
};

/// The well-known name of the cross-reference document within a scanned
/// directory's documentation output.
pub const LINK_DOCUMENT: &str = "REQUIREMENT_LINK.xml";

/// The only reference kind whose locations are resolvable.
const SUPPORTED_REFERENCE_KIND: &str = "member";

/// Errors raised by a structurally broken cross-reference document.
///
/// All of these are fatal to the current pass: malformed pairing or missing
/// reference data means the document itself cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The document could not be read or is not parseable XML.
    #[error("failed to read/parse cross-reference document {path}: {source}")]
    Read {
        /// The cross-reference document.
        path: PathBuf,
        /// The underlying XML error.
        source: quick_xml::Error,
    },

    /// An attribute in the document could not be parsed.
    #[error("malformed attribute in cross-reference document {path}: {source}")]
    Attr {
        /// The cross-reference document.
        path: PathBuf,
        /// The underlying attribute error.
        source: AttrError,
    },

    /// An entry node carries no `ref` element.
    #[error("missing ref element for entry in {path}")]
    MissingReference {
        /// The cross-reference document.
        path: PathBuf,
    },

    /// A `ref` element lacks its `refid` attribute.
    #[error("missing refid attribute for ref element in {path}")]
    MissingReferenceId {
        /// The cross-reference document.
        path: PathBuf,
    },

    /// A `ref` element lacks its `kindref` attribute.
    #[error("missing kindref attribute for ref element in {path}")]
    MissingReferenceKind {
        /// The cross-reference document.
        path: PathBuf,
    },

    /// An entry node is not immediately followed by its paired item node.
    #[error("missing listitem after entry '{refid}' in {path}")]
    MissingItem {
        /// The cross-reference document.
        path: PathBuf,
        /// The reference id of the unpaired entry.
        refid: String,
    },

    /// The document ended in the middle of a node.
    #[error("unexpected end of cross-reference document {path}")]
    UnexpectedEof {
        /// The cross-reference document.
        path: PathBuf,
    },
}

/// A fatal failure of one linkage pass.
///
/// Pass failures are caught at the pass boundary: the repository retains the
/// links committed by completed passes and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// The cross-reference document is structurally broken.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A reference id could not be resolved to a source location.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// The result of a successful linkage pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The scanned directory produced no cross-reference document at all,
    /// which simply means it contains no requirement references.
    NoDocument,

    /// The document was parsed and applied.
    Completed {
        /// The number of links that were new to the repository.
        links_added: usize,
    },
}

/// A supported entry node, reduced to its reference data.
#[derive(Debug)]
struct Entry {
    tag: String,
    refid: String,
    kindref: String,
}

/// Runs one linkage pass over the cross-reference document in `directory`,
/// recording every extracted link with the given kind.
///
/// An absent document is not an error; the pass reports
/// [`PassOutcome::NoDocument`] and changes nothing. Links to requirement
/// names absent from every module are dropped with a warning.
///
/// # Errors
///
/// Returns a [`PassError`] if the document exists but cannot be parsed, if an
/// entry/item pairing is malformed, or if a reference id cannot be resolved
/// to a source location. On error the repository is untouched by this pass.
pub fn run_pass(
    directory: &Path,
    kind: LinkKind,
    repository: &mut Repository,
    diagnostics: &mut Diagnostics,
) -> Result<PassOutcome, PassError> {
    let path = directory.join(LINK_DOCUMENT);
    if !path.is_file() {
        tracing::debug!(
            "no cross-reference document generated for {}",
            directory.display()
        );
        return Ok(PassOutcome::NoDocument);
    }

    tracing::info!("parsing {kind} requirement links from {}", path.display());

    let mut reader = Reader::from_file(&path).map_err(|source| ParseError::Read {
        path: path.clone(),
        source,
    })?;
    reader.config_mut().trim_text(true);

    let evidence = parse_document(&mut reader, &path, directory, kind, diagnostics)?;

    let mut links_added = 0;
    for (name, link) in evidence {
        if repository.add_link(&name, link, diagnostics) == LinkOutcome::Inserted {
            links_added += 1;
        }
    }

    Ok(PassOutcome::Completed { links_added })
}

fn parse_document<R: BufRead>(
    reader: &mut Reader<R>,
    path: &Path,
    directory: &Path,
    kind: LinkKind,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<(String, Link)>, PassError> {
    let mut evidence = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match read_event(reader, &mut buf, path)? {
            Event::Start(element) if element.name().as_ref() == b"varlistentry" => {
                let entry = parse_entry(reader, path)?;

                if entry.kindref != SUPPORTED_REFERENCE_KIND {
                    // The paired item, if present, is skipped along with the
                    // entry on the next iterations.
                    diagnostics.warn(Warning::UnsupportedReferenceKind {
                        refid: entry.refid,
                        kind: entry.kindref,
                    });
                    continue;
                }

                let location = location::resolve(&entry.refid, directory)?;

                for name in expect_item(reader, path, &entry.refid)? {
                    evidence.push((
                        name,
                        Link::new(kind, entry.tag.clone(), location.file.clone(), location.line),
                    ));
                }
            }
            Event::Empty(element) if element.name().as_ref() == b"varlistentry" => {
                return Err(ParseError::MissingReference {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(evidence)
}

/// Consumes an entry node through its end tag, collecting the reference data
/// and the descriptive text chunks that name the referencing symbol.
fn parse_entry<R: BufRead>(reader: &mut Reader<R>, path: &Path) -> Result<Entry, ParseError> {
    let mut texts: Vec<String> = Vec::new();
    let mut reference: Option<(String, String)> = None;
    let mut depth = 0_usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match read_event(reader, &mut buf, path)? {
            Event::Start(element) => {
                if reference.is_none() && element.name().as_ref() == b"ref" {
                    reference = Some(read_reference(&element, path)?);
                }
                depth += 1;
            }
            Event::Empty(element) => {
                if reference.is_none() && element.name().as_ref() == b"ref" {
                    reference = Some(read_reference(&element, path)?);
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| ParseError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                texts.push(text.trim().to_string());
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    path: path.to_path_buf(),
                });
            }
            _ => {}
        }
    }

    let Some((refid, kindref)) = reference else {
        return Err(ParseError::MissingReference {
            path: path.to_path_buf(),
        });
    };

    // The first text chunk is the entry's type label and is ignored; the
    // remaining chunks render the referencing symbol.
    let tag = texts
        .iter()
        .skip(1)
        .filter(|chunk| !chunk.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Entry {
        tag,
        refid,
        kindref,
    })
}

/// Requires the next element after an entry to be its paired item node and
/// returns the requirement names it enumerates.
fn expect_item<R: BufRead>(
    reader: &mut Reader<R>,
    path: &Path,
    refid: &str,
) -> Result<Vec<String>, ParseError> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match read_event(reader, &mut buf, path)? {
            Event::Start(element) => {
                return if element.name().as_ref() == b"listitem" {
                    collect_item(reader, path)
                } else {
                    Err(missing_item(path, refid))
                };
            }
            Event::Empty(element) => {
                return if element.name().as_ref() == b"listitem" {
                    Ok(Vec::new())
                } else {
                    Err(missing_item(path, refid))
                };
            }
            // Stray character data between siblings carries no pairing
            // information.
            Event::Text(_) | Event::Comment(_) => {}
            Event::End(_) | Event::Eof => return Err(missing_item(path, refid)),
            _ => {}
        }
    }
}

/// Consumes an item node through its end tag, returning each non-blank text
/// chunk as one requirement name.
fn collect_item<R: BufRead>(reader: &mut Reader<R>, path: &Path) -> Result<Vec<String>, ParseError> {
    let mut names = Vec::new();
    let mut depth = 0_usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match read_event(reader, &mut buf, path)? {
            Event::Start(_) => depth += 1,
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| ParseError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let name = text.trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedEof {
                    path: path.to_path_buf(),
                });
            }
            _ => {}
        }
    }

    Ok(names)
}

fn read_event<'b, R: BufRead>(
    reader: &mut Reader<R>,
    buf: &'b mut Vec<u8>,
    path: &Path,
) -> Result<Event<'b>, ParseError> {
    reader
        .read_event_into(buf)
        .map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn read_reference(element: &BytesStart<'_>, path: &Path) -> Result<(String, String), ParseError> {
    let refid = attribute(element, "refid", path)?.ok_or_else(|| ParseError::MissingReferenceId {
        path: path.to_path_buf(),
    })?;
    let kindref =
        attribute(element, "kindref", path)?.ok_or_else(|| ParseError::MissingReferenceKind {
            path: path.to_path_buf(),
        })?;
    Ok((refid, kindref))
}

fn attribute(
    element: &BytesStart<'_>,
    name: &str,
    path: &Path,
) -> Result<Option<String>, ParseError> {
    element
        .try_get_attribute(name)
        .map_err(|source| ParseError::Attr {
            path: path.to_path_buf(),
            source,
        })?
        .map(|attribute| {
            attribute
                .unescape_value()
                .map(|value| value.into_owned())
                .map_err(|source| ParseError::Read {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .transpose()
}

fn missing_item(path: &Path, refid: &str) -> ParseError {
    ParseError::MissingItem {
        path: path.to_path_buf(),
        refid: refid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::domain::ExportRow;

    fn repository_with(module: &str, names: &[(&str, &str)]) -> Repository {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();
        repository.load_module(
            module,
            names.iter().map(|(name, text)| ExportRow {
                name: (*name).to_string(),
                text: (*text).to_string(),
            }),
            &mut diagnostics,
        );
        assert!(diagnostics.is_empty());
        repository
    }

    fn write_link_document(dir: &Path, content: &str) {
        std::fs::write(dir.join(LINK_DOCUMENT), content).expect("failed to write link document");
    }

    fn write_symbol_document(dir: &Path, base: &str, content: &str) {
        std::fs::write(dir.join(format!("{base}.xml")), content)
            .expect("failed to write symbol document");
    }

    /// A document with one supported entry linking `funcA` to the given
    /// requirement names.
    fn single_entry_document(names: &[&str]) -> String {
        let items: String = names
            .iter()
            .map(|name| format!("<para>{name}</para>"))
            .collect();
        format!(
            r#"<doxygen><compounddef><detaileddescription><variablelist>
                 <varlistentry><term>Requirement <ref refid="funcA_impl" kindref="member">funcA</ref></term></varlistentry>
                 <listitem>{items}</listitem>
               </variablelist></detaileddescription></compounddef></doxygen>"#
        )
    }

    fn funca_symbol(dir: &Path) {
        write_symbol_document(
            dir,
            "funcA",
            r#"<doxygen><memberdef id="funcA_impl"><location file="src/a.c" line="42"/></memberdef></doxygen>"#,
        );
    }

    #[test]
    fn end_to_end_single_source_link() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), &single_entry_document(&["REQ-1"]));
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect("pass should succeed");

        assert_eq!(outcome, PassOutcome::Completed { links_added: 1 });
        assert!(diagnostics.is_empty());

        let requirement = repository.module("M").unwrap().get("REQ-1").unwrap();
        let links = requirement.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind(), LinkKind::Source);
        assert_eq!(links[0].tag(), "funcA");
        assert_eq!(links[0].file(), "src/a.c");
        assert_eq!(links[0].line().get(), 42);
    }

    #[test]
    fn repeated_passes_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), &single_entry_document(&["REQ-1"]));
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let first = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();
        let second = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(first, PassOutcome::Completed { links_added: 1 });
        assert_eq!(second, PassOutcome::Completed { links_added: 0 });

        let requirement = repository.module("M").unwrap().get("REQ-1").unwrap();
        assert_eq!(requirement.links().len(), 1);
    }

    #[test]
    fn one_item_may_name_several_requirements() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), &single_entry_document(&["REQ-1", "REQ-2"]));
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X"), ("REQ-2", "Y")]);
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Test,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(outcome, PassOutcome::Completed { links_added: 2 });
        let module = repository.module("M").unwrap();
        assert!(module.get("REQ-1").unwrap().has_link(LinkKind::Test));
        assert!(module.get("REQ-2").unwrap().has_link(LinkKind::Test));
    }

    #[test]
    fn absent_document_is_a_neutral_pass() {
        let dir = tempfile::tempdir().unwrap();

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let before = repository.clone();
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(outcome, PassOutcome::NoDocument);
        assert_eq!(repository, before);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unparseable_document_is_fatal_for_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), "<variablelist></wrong>");

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let error = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect_err("malformed XML should fail the pass");

        assert!(matches!(error, PassError::Parse(ParseError::Read { .. })));
    }

    #[test]
    fn unknown_requirement_name_warns_and_leaves_repository() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), &single_entry_document(&["REQ-999"]));
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let before = repository.clone();
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(outcome, PassOutcome::Completed { links_added: 0 });
        assert_eq!(repository, before);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics.warnings()[0],
            Warning::UnknownRequirement { name } if name == "REQ-999"
        ));
    }

    #[test]
    fn unsupported_reference_kind_skips_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(
            dir.path(),
            r#"<doxygen><variablelist>
                 <varlistentry><term>Compound <ref refid="classFoo_1abc" kindref="compound">Foo</ref></term></varlistentry>
                 <listitem><para>REQ-1</para></listitem>
               </variablelist></doxygen>"#,
        );

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let before = repository.clone();
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect("unsupported kinds are skipped, not fatal");

        assert_eq!(outcome, PassOutcome::Completed { links_added: 0 });
        assert_eq!(repository, before);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics.warnings()[0],
            Warning::UnsupportedReferenceKind { kind, .. } if kind == "compound"
        ));
    }

    #[test]
    fn entry_without_item_fails_and_leaves_repository_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // The first pair is well-formed; the trailing entry has no item.
        write_link_document(
            dir.path(),
            r#"<doxygen><variablelist>
                 <varlistentry><term>Requirement <ref refid="funcA_impl" kindref="member">funcA</ref></term></varlistentry>
                 <listitem><para>REQ-1</para></listitem>
                 <varlistentry><term>Requirement <ref refid="funcB_impl" kindref="member">funcB</ref></term></varlistentry>
               </variablelist></doxygen>"#,
        );
        funca_symbol(dir.path());
        write_symbol_document(
            dir.path(),
            "funcB",
            r#"<doxygen><memberdef id="funcB_impl"><location file="src/b.c" line="7"/></memberdef></doxygen>"#,
        );

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let before = repository.clone();
        let mut diagnostics = Diagnostics::new();

        let error = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect_err("missing pairing should fail the pass");

        assert!(matches!(
            error,
            PassError::Parse(ParseError::MissingItem { refid, .. }) if refid == "funcB_impl"
        ));
        // Two-phase application: nothing from the failed pass is committed,
        // not even the valid leading pair.
        assert_eq!(repository, before);
    }

    #[test]
    fn entry_paired_with_wrong_node_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(
            dir.path(),
            r#"<doxygen><variablelist>
                 <varlistentry><term>Requirement <ref refid="funcA_impl" kindref="member">funcA</ref></term></varlistentry>
                 <varlistentry><term>Requirement <ref refid="funcA_impl" kindref="member">funcA</ref></term></varlistentry>
               </variablelist></doxygen>"#,
        );
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let error = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect_err("entry followed by entry is malformed pairing");

        assert!(matches!(
            error,
            PassError::Parse(ParseError::MissingItem { .. })
        ));
    }

    #[test]
    fn entry_without_ref_element_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(
            dir.path(),
            r#"<doxygen><variablelist>
                 <varlistentry><term>Requirement funcA</term></varlistentry>
                 <listitem><para>REQ-1</para></listitem>
               </variablelist></doxygen>"#,
        );

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let error = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect_err("entry without ref is malformed");

        assert!(matches!(
            error,
            PassError::Parse(ParseError::MissingReference { .. })
        ));
    }

    #[test]
    fn unresolvable_reference_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(dir.path(), &single_entry_document(&["REQ-1"]));
        // No funcA.xml symbol document.

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let before = repository.clone();
        let mut diagnostics = Diagnostics::new();

        let error = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .expect_err("unresolvable refid should fail the pass");

        assert!(matches!(error, PassError::Lookup(LookupError::Read { .. })));
        assert_eq!(repository, before);
    }

    #[test]
    fn blank_item_text_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_link_document(
            dir.path(),
            r#"<doxygen><variablelist>
                 <varlistentry><term>Requirement <ref refid="funcA_impl" kindref="member">funcA</ref></term></varlistentry>
                 <listitem><para>  </para><para>REQ-1</para></listitem>
               </variablelist></doxygen>"#,
        );
        funca_symbol(dir.path());

        let mut repository = repository_with("M", &[("REQ-1", "X")]);
        let mut diagnostics = Diagnostics::new();

        let outcome = run_pass(
            dir.path(),
            LinkKind::Source,
            &mut repository,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(outcome, PassOutcome::Completed { links_added: 1 });
        assert!(diagnostics.is_empty());
    }
}
