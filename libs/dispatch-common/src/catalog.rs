// Historical per-test durations for a suite.
//
// The record source lives at `<workspace>/tests/data/<suite>.txt` and holds
// one `name=duration` pair per line, durations in seconds.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;
use crate::types::TestRecord;

/// Relative location of the per-suite duration files inside a workspace.
pub const DURATION_DATA_DIR: &str = "tests/data";

/// Path of the duration record source for `suite`.
pub fn duration_file(workspace: &Path, suite: &str) -> PathBuf {
    workspace
        .join(DURATION_DATA_DIR)
        .join(format!("{}.txt", suite))
}

/// Duration records for one suite, in file order.
#[derive(Debug, Clone, Default)]
pub struct DurationCatalog {
    records: Vec<TestRecord>,
    index: HashMap<String, usize>,
}

impl DurationCatalog {
    /// Parse `name=duration` lines. Blank lines are skipped; a repeated name
    /// keeps its first position and takes the later duration.
    pub fn parse(source: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let malformed = || CatalogError::MalformedRecord {
                line: idx + 1,
                content: raw.to_string(),
            };

            let (name, value) = line.split_once('=').ok_or_else(malformed)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(malformed());
            }
            let duration: f64 = value.trim().parse().map_err(|_| malformed())?;
            if !duration.is_finite() || duration < 0.0 {
                return Err(malformed());
            }

            // `-0` parses as negative zero; store it as plain zero
            catalog.insert(name, duration.abs());
        }

        Ok(catalog)
    }

    /// Read and parse the duration file of `suite` under `workspace`.
    pub fn load(workspace: &Path, suite: &str) -> Result<Self, CatalogError> {
        let path = duration_file(workspace, suite);
        let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog = Self::parse(&content)?;
        debug!(path = %path.display(), records = catalog.len(), "Loaded duration catalog");
        Ok(catalog)
    }

    fn insert(&mut self, name: &str, duration: f64) {
        match self.index.get(name) {
            Some(&pos) => self.records[pos].duration = duration,
            None => {
                self.index.insert(name.to_string(), self.records.len());
                self.records.push(TestRecord::new(name, duration));
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every live test must have a duration. Returns the names that do not,
    /// sorted, as the error value.
    pub fn validate<'a, I>(&self, live: I) -> Result<(), BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let missing: BTreeSet<String> = live
            .into_iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_keeps_file_order() {
        let catalog = DurationCatalog::parse("a=5.0\nb=9\n\nc = 1.5\n").unwrap();
        let names: Vec<&str> = catalog.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(catalog.records()[2], TestRecord::new("c", 1.5));
        assert!(!catalog.contains("missing"));
    }

    #[test]
    fn test_parse_duplicate_keeps_position_takes_last_value() {
        let catalog = DurationCatalog::parse("a=1\nb=2\na=7\n").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0], TestRecord::new("a", 7.0));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        for (source, bad_line) in [
            ("a=1\nno_separator\n", 2),
            ("=3.0\n", 1),
            ("a=fast\n", 1),
            ("a=1\nb=-2\n", 2),
            ("a=NaN\n", 1),
            ("a=inf\n", 1),
        ] {
            match DurationCatalog::parse(source) {
                Err(CatalogError::MalformedRecord { line, .. }) => assert_eq!(line, bad_line, "{source:?}"),
                other => panic!("expected MalformedRecord for {source:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_negative_zero_is_zero() {
        let catalog = DurationCatalog::parse("a=-0\nb=0\n").unwrap();
        assert!(catalog.records().iter().all(|r| r.duration.is_sign_positive()));
    }

    #[test]
    fn test_validate_reports_missing_names() {
        let catalog = DurationCatalog::parse("t1=3\n").unwrap();
        let live: Vec<String> = vec!["t1".into(), "t2".into()];
        let missing = catalog.validate(&live).unwrap_err();
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["t2".to_string()]);
    }

    #[test]
    fn test_validate_accepts_superset_catalog() {
        let catalog = DurationCatalog::parse("t1=3\nt2=4\nretired=8\n").unwrap();
        let live: Vec<String> = vec!["t1".into(), "t2".into()];
        assert!(catalog.validate(&live).is_ok());
    }

    #[test]
    fn test_load_from_workspace() {
        let workspace = tempfile::tempdir().unwrap();
        let data_dir = workspace.path().join(DURATION_DATA_DIR);
        fs::create_dir_all(&data_dir).unwrap();
        let mut file = fs::File::create(data_dir.join("ShortSystemTests.txt")).unwrap();
        writeln!(file, "test_a=12.5").unwrap();
        writeln!(file, "test_b=3").unwrap();

        let catalog = DurationCatalog::load(workspace.path(), "ShortSystemTests").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0], TestRecord::new("test_a", 12.5));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let workspace = tempfile::tempdir().unwrap();
        let err = DurationCatalog::load(workspace.path(), "Nope").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
