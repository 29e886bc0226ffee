use std::{fmt, num::NonZeroU32};

/// The kind of evidence a link provides.
///
/// Source links tie a requirement to the code that implements it; test links
/// tie it to the code that verifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkKind {
    /// The link points into production source code.
    Source,
    /// The link points into test code.
    Test,
}

impl LinkKind {
    /// A short human-readable label, used in report lines and table headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Source => "source code",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One piece of evidence that a requirement is addressed at a specific
/// location in source or test code.
///
/// A link is immutable once constructed. Equality is structural: two links
/// are equal iff all four fields match exactly, and the requirement link sets
/// deduplicate on that equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    kind: LinkKind,
    tag: String,
    file: String,
    line: NonZeroU32,
}

impl Link {
    /// Constructs a link from its four components.
    ///
    /// `file` is stored exactly as reported by the documentation tool; it is
    /// never canonicalized, so two links to the same file through different
    /// path spellings are distinct.
    #[must_use]
    pub const fn new(kind: LinkKind, tag: String, file: String, line: NonZeroU32) -> Self {
        Self {
            kind,
            tag,
            file,
            line,
        }
    }

    /// Whether this is source-code or test-code evidence.
    #[must_use]
    pub const fn kind(&self) -> LinkKind {
        self.kind
    }

    /// The referencing symbol, e.g. a function name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The file containing the reference, as reported.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The 1-based line number of the reference.
    #[must_use]
    pub const fn line(&self) -> NonZeroU32 {
        self.line
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.tag, self.file, self.line)
    }
}
