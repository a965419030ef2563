// Live test discovery through the compiled gtest binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use crate::error::EnumerationError;

/// Default location of the test binary inside a workspace.
pub const DEFAULT_TEST_BINARY: &str = "install/lizardfs/bin/lizardfs-tests";

/// Source of the live test inventory for a suite.
pub trait TestEnumerator {
    fn list_tests(&self, workspace: &Path, suite: &str) -> Result<Vec<String>, EnumerationError>;
}

/// Enumerates tests with `--gtest_list_tests --gtest_filter=<suite>*`.
#[derive(Debug, Clone, Default)]
pub struct GtestEnumerator {
    binary: Option<PathBuf>,
}

impl GtestEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary instead of the workspace default.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    pub fn binary_path(&self, workspace: &Path) -> PathBuf {
        match &self.binary {
            Some(path) => path.clone(),
            None => workspace.join(DEFAULT_TEST_BINARY),
        }
    }
}

impl TestEnumerator for GtestEnumerator {
    #[instrument(skip(self, workspace), fields(workspace = %workspace.display()))]
    fn list_tests(&self, workspace: &Path, suite: &str) -> Result<Vec<String>, EnumerationError> {
        let binary = self.binary_path(workspace);
        let output = Command::new(&binary)
            .arg("--gtest_list_tests")
            .arg(format!("--gtest_filter={}*", suite))
            .output()
            .map_err(|source| EnumerationError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EnumerationError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let tests = parse_gtest_listing(&String::from_utf8_lossy(&output.stdout));
        debug!(count = tests.len(), "Enumerated live tests");
        Ok(tests)
    }
}

/// Extract test names from `--gtest_list_tests` output.
///
/// Suite headers (`Suite.`) are unindented, tests are indented, and
/// parameterized tests carry a trailing `# GetParam() = ...` comment.
/// Anything else, like the `Running main()` banner, is ignored.
pub fn parse_gtest_listing(output: &str) -> Vec<String> {
    let mut in_suite = false;
    let mut tests = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if !indented {
            let header = line.split('#').next().unwrap_or_default().trim();
            in_suite = header.ends_with('.');
            continue;
        }

        if !in_suite {
            continue;
        }

        let name = line.split('#').next().unwrap_or_default().trim();
        if !name.is_empty() {
            tests.push(name.to_string());
        }
    }

    tests
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_skips_banner_and_headers() {
        let output = "Running main() from gtest_main.cc\n\
                      LongSystemTests.\n  test_one\n  test_two\n";
        assert_eq!(parse_gtest_listing(output), vec!["test_one", "test_two"]);
    }

    #[test]
    fn test_parse_listing_strips_param_comments() {
        let output = "SuiteP/Values.  # TypeParam = int\n  case/0  # GetParam() = 1\n  case/1  # GetParam() = 2\n";
        assert_eq!(parse_gtest_listing(output), vec!["case/0", "case/1"]);
    }

    #[test]
    fn test_parse_listing_multiple_matching_suites() {
        let output = "LongSystemTests.\n  a\nLongSystemTestsExtra.\n  b\n";
        assert_eq!(parse_gtest_listing(output), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_listing_ignores_indented_lines_before_any_suite() {
        let output = "  stray\nSuite.\n  real\n";
        assert_eq!(parse_gtest_listing(output), vec!["real"]);
    }

    #[test]
    fn test_default_binary_path_is_workspace_relative() {
        let enumerator = GtestEnumerator::new();
        assert_eq!(
            enumerator.binary_path(Path::new("/ws")),
            PathBuf::from("/ws/install/lizardfs/bin/lizardfs-tests")
        );
        let custom = GtestEnumerator::with_binary("/opt/tests");
        assert_eq!(custom.binary_path(Path::new("/ws")), PathBuf::from("/opt/tests"));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let workspace = tempfile::tempdir().unwrap();
        let err = GtestEnumerator::new()
            .list_tests(workspace.path(), "Suite")
            .unwrap_err();
        assert!(matches!(err, EnumerationError::Spawn { .. }));
    }
}
