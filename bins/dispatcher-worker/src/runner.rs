// Runs a single dispatched test through the gtest binary

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

pub struct TestRunner {
    binary: PathBuf,
    suite: String,
}

impl TestRunner {
    pub fn new(binary: PathBuf, suite: impl Into<String>) -> Self {
        Self {
            binary,
            suite: suite.into(),
        }
    }

    /// gtest filter selecting exactly `test` within the suite.
    pub fn filter_for(&self, test: &str) -> String {
        if test.contains('.') {
            format!("--gtest_filter={}", test)
        } else {
            format!("--gtest_filter={}.{}", self.suite, test)
        }
    }

    /// Run one test, inheriting stdout/stderr so its log lands in the build output.
    #[instrument(skip(self), fields(suite = %self.suite))]
    pub async fn run(&self, test: &str) -> Result<TestOutcome> {
        let start = Instant::now();
        let status = Command::new(&self.binary)
            .arg(self.filter_for(test))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("Failed to launch {}", self.binary.display()))?;

        Ok(TestOutcome {
            name: test.to_string(),
            passed: status.success(),
            exit_code: status.code(),
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_qualifies_bare_names() {
        let runner = TestRunner::new(PathBuf::from("/bin/true"), "LongSystemTests");
        assert_eq!(runner.filter_for("test_io"), "--gtest_filter=LongSystemTests.test_io");
        assert_eq!(runner.filter_for("Other.test_io"), "--gtest_filter=Other.test_io");
    }

    #[tokio::test]
    async fn test_exit_status_decides_pass() {
        let pass = TestRunner::new(PathBuf::from("true"), "S").run("t").await.unwrap();
        assert!(pass.passed);
        assert_eq!(pass.exit_code, Some(0));

        let fail = TestRunner::new(PathBuf::from("false"), "S").run("t").await.unwrap();
        assert!(!fail.passed);
        assert_eq!(fail.name, "t");
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let runner = TestRunner::new(PathBuf::from("/nonexistent/tests-binary"), "S");
        assert!(runner.run("t").await.is_err());
    }
}
