//! The two-level requirement map: module name → requirement name → entry.

use crate::{
    diagnostics::{Diagnostics, Warning},
    domain::{Link, Requirement},
};

/// One row of a validated module export: a requirement name and its
/// statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// The requirement name, unique within its module.
    pub name: String,
    /// The requirement statement. May be empty.
    pub text: String,
}

/// A named grouping of requirements, corresponding to one requirements
/// database export unit.
///
/// Requirement names are unique within a module; the entries preserve the
/// order rows were loaded, with a duplicated name taking the position of its
/// last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    name: String,
    requirements: Vec<(String, Requirement)>,
}

impl Module {
    fn new(name: String) -> Self {
        Self {
            name,
            requirements: Vec::new(),
        }
    }

    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of requirements in this module.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// `true` if the module holds no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// The requirements in load order.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, &Requirement)> {
        self.requirements
            .iter()
            .map(|(name, requirement)| (name.as_str(), requirement))
    }

    /// Looks up a requirement by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, requirement)| requirement)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Requirement> {
        self.requirements
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, requirement)| requirement)
    }

    fn insert_row(&mut self, row: ExportRow, diagnostics: &mut Diagnostics) {
        if let Some(position) = self
            .requirements
            .iter()
            .position(|(name, _)| *name == row.name)
        {
            diagnostics.warn(Warning::DuplicateRequirement {
                module: self.name.clone(),
                name: row.name.clone(),
            });
            self.requirements.remove(position);
        }
        self.requirements.push((row.name, Requirement::new(row.text)));
    }
}

/// The result of attempting to attach a link to a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link was new and has been recorded.
    Inserted,
    /// A structurally equal link was already present; nothing changed.
    Duplicate,
    /// No loaded module contains the requirement; the link was dropped and a
    /// warning recorded.
    UnknownRequirement,
}

/// An in-memory map of every loaded requirement module, enriched in place by
/// linkage parser passes.
///
/// The repository is created empty, populated once per module from that
/// module's export, mutated by an arbitrary number of parser passes, and then
/// treated as read-only input by the coverage aggregator and the renderers.
/// Nothing is ever deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    modules: Vec<Module>,
}

impl Repository {
    /// Creates an empty repository.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Loads a module from validated export rows.
    ///
    /// A duplicate requirement name within one load records a warning; the
    /// later row's entry replaces the earlier one and takes its position.
    /// Reloading a module name replaces that module's contents wholesale.
    pub fn load_module<I>(&mut self, name: &str, rows: I, diagnostics: &mut Diagnostics)
    where
        I: IntoIterator<Item = ExportRow>,
    {
        let mut module = Module::new(name.to_string());
        for row in rows {
            module.insert_row(row, diagnostics);
        }

        if let Some(existing) = self
            .modules
            .iter_mut()
            .find(|candidate| candidate.name == name)
        {
            *existing = module;
        } else {
            self.modules.push(module);
        }
    }

    /// Attaches a link to the named requirement, searching every module.
    ///
    /// Requirement names are unique across modules by construction of the
    /// export data, so the first match is the only match. If the name exists
    /// in no module the link is dropped, a [`Warning::UnknownRequirement`] is
    /// recorded, and the repository is left untouched.
    pub fn add_link(
        &mut self,
        requirement: &str,
        link: Link,
        diagnostics: &mut Diagnostics,
    ) -> LinkOutcome {
        for module in &mut self.modules {
            if let Some(entry) = module.get_mut(requirement) {
                return if entry.insert_link(link) {
                    LinkOutcome::Inserted
                } else {
                    LinkOutcome::Duplicate
                };
            }
        }

        diagnostics.warn(Warning::UnknownRequirement {
            name: requirement.to_string(),
        });
        LinkOutcome::UnknownRequirement
    }

    /// The loaded modules, in load order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Looks up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// The number of loaded modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// `true` if no modules have been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::domain::LinkKind;

    fn row(name: &str, text: &str) -> ExportRow {
        ExportRow {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    fn source_link(tag: &str, file: &str, line: u32) -> Link {
        Link::new(
            LinkKind::Source,
            tag.to_string(),
            file.to_string(),
            NonZeroU32::new(line).unwrap(),
        )
    }

    #[test]
    fn load_module_round_trips_rows() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();

        repository.load_module(
            "SYSTEM",
            vec![row("REQ-1", "Do X"), row("REQ-2", "Do Y")],
            &mut diagnostics,
        );

        let module = repository.module("SYSTEM").expect("module should exist");
        let entries: Vec<_> = module.requirements().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "REQ-1");
        assert_eq!(entries[0].1.text(), "Do X");
        assert!(entries[0].1.links().is_empty());
        assert_eq!(entries[1].0, "REQ-2");
        assert_eq!(entries[1].1.text(), "Do Y");
        assert!(entries[1].1.links().is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn duplicate_row_replaces_and_warns() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();

        repository.load_module(
            "SYSTEM",
            vec![
                row("REQ-1", "First wording"),
                row("REQ-2", "Do Y"),
                row("REQ-1", "Second wording"),
            ],
            &mut diagnostics,
        );

        let module = repository.module("SYSTEM").unwrap();
        assert_eq!(module.len(), 2);
        assert_eq!(
            module.get("REQ-1").map(Requirement::text),
            Some("Second wording")
        );

        // The replacement takes the position of the last write.
        let names: Vec<_> = module.requirements().map(|(name, _)| name).collect();
        assert_eq!(names, ["REQ-2", "REQ-1"]);

        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics.warnings()[0],
            Warning::DuplicateRequirement { module, name }
                if module == "SYSTEM" && name == "REQ-1"
        ));
    }

    #[test]
    fn same_name_may_exist_in_different_modules() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();

        repository.load_module("A", vec![row("REQ-1", "In A")], &mut diagnostics);
        repository.load_module("B", vec![row("REQ-1", "In B")], &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(
            repository.module("A").unwrap().get("REQ-1").unwrap().text(),
            "In A"
        );
        assert_eq!(
            repository.module("B").unwrap().get("REQ-1").unwrap().text(),
            "In B"
        );
    }

    #[test]
    fn add_link_is_idempotent() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();
        repository.load_module("SYSTEM", vec![row("REQ-1", "Do X")], &mut diagnostics);

        let first = repository.add_link("REQ-1", source_link("funcA", "src/a.c", 42), &mut diagnostics);
        let second =
            repository.add_link("REQ-1", source_link("funcA", "src/a.c", 42), &mut diagnostics);

        assert_eq!(first, LinkOutcome::Inserted);
        assert_eq!(second, LinkOutcome::Duplicate);

        let requirement = repository.module("SYSTEM").unwrap().get("REQ-1").unwrap();
        assert_eq!(requirement.links().len(), 1);
    }

    #[test]
    fn add_link_to_unknown_requirement_warns_and_leaves_state() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();
        repository.load_module("SYSTEM", vec![row("REQ-1", "Do X")], &mut diagnostics);

        let before = repository.clone();
        let outcome =
            repository.add_link("REQ-999", source_link("funcA", "src/a.c", 42), &mut diagnostics);

        assert_eq!(outcome, LinkOutcome::UnknownRequirement);
        assert_eq!(repository, before);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics.warnings()[0],
            Warning::UnknownRequirement { name } if name == "REQ-999"
        ));
    }

    #[test]
    fn modules_iterate_in_load_order() {
        let mut repository = Repository::new();
        let mut diagnostics = Diagnostics::new();

        repository.load_module("GAMMA", Vec::new(), &mut diagnostics);
        repository.load_module("ALPHA", Vec::new(), &mut diagnostics);
        repository.load_module("BETA", Vec::new(), &mut diagnostics);

        let names: Vec<_> = repository.modules().map(Module::name).collect();
        assert_eq!(names, ["GAMMA", "ALPHA", "BETA"]);
    }
}
