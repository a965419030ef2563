// Builds the ordered test list submitted for one (build, suite).
//
// Live tests come from a [`TestEnumerator`], durations from the suite's
// [`DurationCatalog`]. The result is ordered longest-first so that workers
// greedily pulling the queue head approximate an optimal makespan.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::catalog::DurationCatalog;
use crate::enumerator::TestEnumerator;
use crate::error::WorkListError;
use crate::types::TestRecord;

/// Separator between suite and test in a qualified name.
pub const SUITE_SEPARATOR: char = '.';

/// Separator of the CLI `--excluded-tests` list.
pub const EXCLUSION_LIST_SEPARATOR: char = ':';

/// Excluded tests in both `Suite.name` and bare `name` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn build<I, S>(excluded_raw: I, suite: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = HashSet::new();
        for token in excluded_raw {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            names.insert(token.to_string());
            match token.split_once(SUITE_SEPARATOR) {
                Some((_, bare)) => names.insert(bare.to_string()),
                None => names.insert(format!("{}{}{}", suite, SUITE_SEPARATOR, token)),
            };
        }
        Self { names }
    }

    /// Parse a `:`-separated exclusion list.
    pub fn from_delimited(raw: &str, suite: &str) -> Self {
        Self::build(raw.split(EXCLUSION_LIST_SEPARATOR), suite)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub struct WorkListBuilder<E> {
    enumerator: E,
}

impl<E: TestEnumerator> WorkListBuilder<E> {
    pub fn new(enumerator: E) -> Self {
        Self { enumerator }
    }

    /// Live tests of `suite` with exclusions removed.
    pub fn discover_live_tests(
        &self,
        workspace: &Path,
        suite: &str,
        exclusions: &ExclusionSet,
    ) -> Result<BTreeSet<String>, WorkListError> {
        let live = self.enumerator.list_tests(workspace, suite)?;
        Ok(live
            .into_iter()
            .filter(|name| !exclusions.contains(name))
            .collect())
    }

    /// Ordered test names for a run of `suite`, longest first.
    pub fn list_tests<S: AsRef<str>>(
        &self,
        workspace: &Path,
        suite: &str,
        excluded_raw: &[S],
    ) -> Result<Vec<String>, WorkListError> {
        Ok(self
            .list_tests_with_durations(workspace, suite, excluded_raw)?
            .into_iter()
            .map(|record| record.name)
            .collect())
    }

    /// Like [`list_tests`](Self::list_tests) but keeps the durations.
    pub fn list_tests_with_durations<S: AsRef<str>>(
        &self,
        workspace: &Path,
        suite: &str,
        excluded_raw: &[S],
    ) -> Result<Vec<TestRecord>, WorkListError> {
        self.list_tests_excluding(workspace, suite, &ExclusionSet::build(excluded_raw, suite))
    }

    /// Ordered records of `suite` with an already built exclusion set.
    #[instrument(skip(self, workspace, exclusions), fields(workspace = %workspace.display()))]
    pub fn list_tests_excluding(
        &self,
        workspace: &Path,
        suite: &str,
        exclusions: &ExclusionSet,
    ) -> Result<Vec<TestRecord>, WorkListError> {
        let live = self.discover_live_tests(workspace, suite, exclusions)?;

        let catalog = DurationCatalog::load(workspace, suite)?;
        catalog
            .validate(&live)
            .map_err(|missing| WorkListError::IncompleteDurationData {
                suite: suite.to_string(),
                missing,
            })?;

        let records: Vec<TestRecord> = catalog
            .records()
            .iter()
            .filter(|record| !exclusions.contains(&record.name))
            .cloned()
            .collect();

        let stale = records.iter().filter(|r| !live.contains(&r.name)).count();
        if stale > 0 {
            warn!(stale, "Duration catalog lists tests that were not discovered");
        }

        let ordered = order_by_duration(records);
        info!(
            tests = ordered.len(),
            excluded = exclusions.len(),
            total_secs = ordered.iter().map(|r| r.duration).sum::<f64>(),
            "Built work list"
        );
        Ok(ordered)
    }
}

/// Stable sort by duration, longest first; equal durations keep input order.
/// `-0.0` and `0.0` count as equal.
pub fn order_by_duration(mut records: Vec<TestRecord>) -> Vec<TestRecord> {
    records.sort_by(|a, b| b.duration.partial_cmp(&a.duration).unwrap_or(Ordering::Equal));
    records
}
