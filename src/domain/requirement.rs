use crate::domain::{Link, LinkKind};

/// A requirement's descriptive text plus the link evidence accumulated for
/// it.
///
/// The link collection behaves as an insertion-ordered set: inserting a link
/// that is structurally equal to one already present is a no-op, so repeated
/// parser passes over the same documentation output never inflate the
/// evidence. Order is preserved purely for deterministic rendering and
/// carries no semantic weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    text: String,
    links: Vec<Link>,
}

impl Requirement {
    /// Creates a requirement with the given statement text and no links.
    #[must_use]
    pub const fn new(text: String) -> Self {
        Self {
            text,
            links: Vec::new(),
        }
    }

    /// The requirement statement. May be empty.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All links, in insertion order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The links of one kind, in insertion order.
    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.kind() == kind)
    }

    /// Inserts a link, deduplicating on structural equality.
    ///
    /// Returns `true` if the link was new, or `false` if an equal link was
    /// already present (in which case nothing changes).
    pub fn insert_link(&mut self, link: Link) -> bool {
        if self.links.contains(&link) {
            false
        } else {
            self.links.push(link);
            true
        }
    }

    /// `true` if at least one link of the given kind is present.
    #[must_use]
    pub fn has_link(&self, kind: LinkKind) -> bool {
        self.links.iter().any(|link| link.kind() == kind)
    }

    /// Whether this requirement counts as satisfied for the given kind.
    ///
    /// A requirement is satisfied when it has at least one link of that kind,
    /// or when its text is empty: an explicitly blank requirement is exempt
    /// from every link check and is never flagged as unmet.
    #[must_use]
    pub fn is_satisfied(&self, kind: LinkKind) -> bool {
        self.text.is_empty() || self.has_link(kind)
    }
}
