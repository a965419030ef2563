// CLI commands for build orchestration scripts
use anyhow::{bail, Context, Result};
use dispatch_common::client::{DispatcherClient, PushOutcome};
use dispatch_common::config::ClientConfig;
use dispatch_common::enumerator::{GtestEnumerator, TestEnumerator};
use dispatch_common::types::PushListRequest;
use dispatch_common::worklist::{ExclusionSet, WorkListBuilder};
use std::path::{Path, PathBuf};
use tracing::info;

/// Build the ordered push request for a suite.
pub fn build_request<E: TestEnumerator>(
    enumerator: E,
    build_id: &str,
    workspace: &Path,
    test_suite: &str,
    excluded_tests: &str,
) -> Result<PushListRequest> {
    let exclusions = ExclusionSet::from_delimited(excluded_tests, test_suite);
    let records = WorkListBuilder::new(enumerator)
        .list_tests_excluding(workspace, test_suite, &exclusions)
        .with_context(|| format!("Failed to build the test list for {}", test_suite))?;

    info!(
        tests = records.len(),
        expected_secs = records.iter().map(|r| r.duration).sum::<f64>(),
        "Ordered test list ready"
    );

    Ok(PushListRequest {
        build_id: build_id.to_string(),
        test_suite: test_suite.to_string(),
        tests: records.into_iter().map(|r| r.name).collect(),
    })
}

/// Build the longest-first list of a suite and submit it to the dispatcher.
pub async fn push_list(
    build_id: &str,
    workspace: &Path,
    test_suite: &str,
    excluded_tests: &str,
    test_binary: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let enumerator = match test_binary {
        Some(binary) => GtestEnumerator::with_binary(binary),
        None => GtestEnumerator::new(),
    };

    let request = {
        let build_id = build_id.to_string();
        let workspace = workspace.to_path_buf();
        let test_suite = test_suite.to_string();
        let excluded_tests = excluded_tests.to_string();
        tokio::task::spawn_blocking(move || {
            build_request(enumerator, &build_id, &workspace, &test_suite, &excluded_tests)
        })
        .await
        .context("Test list builder panicked")??
    };

    if dry_run {
        for test in &request.tests {
            println!("{}", test);
        }
        return Ok(());
    }

    if request.tests.is_empty() {
        bail!("No tests left to dispatch for suite {}", test_suite);
    }

    let client = DispatcherClient::new(&ClientConfig::from_env())?;
    submit(&client, &request).await
}

/// Submit a built list. A list already queued for the same build and suite
/// is an error for the calling script.
pub async fn submit(client: &DispatcherClient, request: &PushListRequest) -> Result<()> {
    match client.push_list(request).await? {
        PushOutcome::Created { queued } => {
            println!("Queued {} tests for {}/{}", queued, request.build_id, request.test_suite);
            Ok(())
        }
        PushOutcome::Conflict => {
            bail!(
                "A test list for build {} and suite {} was already submitted",
                request.build_id,
                request.test_suite
            )
        }
    }
}

/// Print the next test name, or an empty line once the queue is gone.
pub async fn next_test(build_id: &str, test_suite: &str) -> Result<()> {
    let client = DispatcherClient::new(&ClientConfig::from_env())?;
    let next = client
        .next_test(build_id, test_suite)
        .await
        .context("Failed to fetch next test")?;
    println!("{}", next.unwrap_or_default());
    Ok(())
}
