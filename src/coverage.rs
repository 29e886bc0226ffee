//! Coverage aggregation over the requirement repository.
//!
//! Aggregation is a pure fold: it may be recomputed at any time from the
//! repository's current contents and holds no state of its own. The
//! percentage formula lives in exactly one place
//! ([`CoverageStats::percent`]) so that every renderer, including ones that
//! re-derive the numbers as live spreadsheet formulas, reproduces it
//! verbatim.

use crate::domain::{LinkKind, Repository, Requirement};

/// Link-coverage counters for one module, or for the whole repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageStats {
    requirements: usize,
    satisfied: Vec<(LinkKind, usize)>,
}

impl CoverageStats {
    fn new(kinds: &[LinkKind]) -> Self {
        Self {
            requirements: 0,
            satisfied: kinds.iter().map(|&kind| (kind, 0)).collect(),
        }
    }

    fn record(&mut self, requirement: &Requirement) {
        self.requirements += 1;
        for (kind, count) in &mut self.satisfied {
            if requirement.is_satisfied(*kind) {
                *count += 1;
            }
        }
    }

    /// The number of requirements counted.
    #[must_use]
    pub const fn requirements(&self) -> usize {
        self.requirements
    }

    /// The number of requirements satisfied for the given kind.
    ///
    /// A kind that was not requested during aggregation reports zero.
    #[must_use]
    pub fn satisfied(&self, kind: LinkKind) -> usize {
        self.satisfied
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map_or(0, |(_, count)| *count)
    }

    /// The percentage of requirements satisfied for the given kind, in the
    /// range `0.0..=100.0`.
    ///
    /// A module with zero requirements reports 0% rather than dividing by
    /// zero. This is a policy choice: callers must not treat 0% as "fully
    /// covered".
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, kind: LinkKind) -> f64 {
        if self.requirements == 0 {
            return 0.0;
        }
        100.0 * (self.satisfied(kind) as f64 / self.requirements as f64)
    }

    /// `true` when every counted requirement is satisfied for the given
    /// kind.
    ///
    /// This is an exact integer comparison, unlike [`Self::percent`], so it
    /// is the right predicate for flagging incomplete modules. A module with
    /// zero requirements is trivially complete.
    #[must_use]
    pub fn is_complete(&self, kind: LinkKind) -> bool {
        self.satisfied(kind) == self.requirements
    }
}

/// Per-module and overall coverage, derived from a repository snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    kinds: Vec<LinkKind>,
    modules: Vec<(String, CoverageStats)>,
    overall: CoverageStats,
}

impl CoverageReport {
    /// Computes coverage for every module and in total, for the requested
    /// link kinds.
    #[must_use]
    pub fn aggregate(repository: &Repository, kinds: &[LinkKind]) -> Self {
        let mut overall = CoverageStats::new(kinds);
        let mut modules = Vec::new();

        for module in repository.modules() {
            let mut stats = CoverageStats::new(kinds);
            for (_, requirement) in module.requirements() {
                stats.record(requirement);
                overall.record(requirement);
            }
            modules.push((module.name().to_string(), stats));
        }

        Self {
            kinds: kinds.to_vec(),
            modules,
            overall,
        }
    }

    /// The link kinds this report was aggregated for.
    #[must_use]
    pub fn kinds(&self) -> &[LinkKind] {
        &self.kinds
    }

    /// Per-module statistics, in module load order.
    pub fn modules(&self) -> impl Iterator<Item = (&str, &CoverageStats)> {
        self.modules
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
    }

    /// Statistics over every requirement of every module.
    #[must_use]
    pub const fn overall(&self) -> &CoverageStats {
        &self.overall
    }
}
