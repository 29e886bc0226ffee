//! One traceability run: module loading, linkage passes, aggregation.
//!
//! The run owns the single shared repository and its diagnostics sink.
//! Module exports are independent of each other and load in parallel; parser
//! passes run sequentially because they all mutate the one repository.

use std::path::PathBuf;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    coverage::CoverageReport,
    diagnostics::Diagnostics,
    domain::{Config, ExportRow, LinkKind, Repository},
    storage::{export, SchemaError},
    xref::{self, PassError, PassOutcome},
};

/// A linkage pass that failed and contributed nothing.
#[derive(Debug)]
pub struct PassFailure {
    /// The directory whose cross-reference document failed.
    pub directory: PathBuf,
    /// Why the pass failed.
    pub error: PassError,
}

/// An in-progress traceability run: the repository being enriched plus the
/// diagnostics accumulated along the way.
#[derive(Debug, Default)]
pub struct Engine {
    repository: Repository,
    diagnostics: Diagnostics,
}

impl Engine {
    /// Builds the requirement repository from the configured module exports.
    ///
    /// Exports are read in parallel; modules enter the repository in
    /// configuration order regardless of which export finished first.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if no modules are configured or if any
    /// export is malformed. Either is fatal to the whole run: a requirement
    /// map built from a bad export cannot be trusted.
    pub fn load(config: &Config) -> Result<Self, SchemaError> {
        if config.modules.is_empty() {
            return Err(SchemaError::NoModules);
        }

        let module_dir = config.module_dir();

        let loaded: Vec<(String, Vec<ExportRow>)> = config
            .modules
            .par_iter()
            .map(|name| {
                let path = module_dir.join(format!("{name}.csv"));
                export::read_module(&path).map(|rows| (name.clone(), rows))
            })
            .collect::<Result<_, _>>()?;

        let mut engine = Self::default();
        for (name, rows) in loaded {
            engine
                .repository
                .load_module(&name, rows, &mut engine.diagnostics);
        }

        tracing::info!("loaded {} requirement modules", engine.repository.len());
        Ok(engine)
    }

    /// Runs linkage passes over every cross-reference document found beneath
    /// the configured source and test roots.
    ///
    /// A failing pass is caught at the pass boundary: it contributes no
    /// links, its error is logged and returned, and the run continues with
    /// the next directory. Links committed by completed passes are retained.
    pub fn scan(&mut self, config: &Config) -> Vec<PassFailure> {
        let mut failures = Vec::new();

        for (roots, kind) in [
            (&config.src_dirs, LinkKind::Source),
            (&config.test_dirs, LinkKind::Test),
        ] {
            for root in roots {
                tracing::info!("scanning {} for {kind} links", root.display());

                let directories = xref::link_directories(root);
                if directories.is_empty() {
                    tracing::debug!("no cross-reference documents under {}", root.display());
                }

                for directory in directories {
                    match xref::run_pass(
                        &directory,
                        kind,
                        &mut self.repository,
                        &mut self.diagnostics,
                    ) {
                        Ok(PassOutcome::Completed { links_added }) => {
                            tracing::debug!(
                                "added {links_added} links from {}",
                                directory.display()
                            );
                        }
                        Ok(PassOutcome::NoDocument) => {}
                        Err(error) => {
                            tracing::error!(
                                "linkage pass failed for {}: {error}",
                                directory.display()
                            );
                            failures.push(PassFailure { directory, error });
                        }
                    }
                }
            }
        }

        failures
    }

    /// Aggregates coverage for the requested kinds from the repository's
    /// current contents.
    #[must_use]
    pub fn aggregate(&self, kinds: &[LinkKind]) -> CoverageReport {
        CoverageReport::aggregate(&self.repository, kinds)
    }

    /// The requirement repository in its current state.
    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The warnings accumulated so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
