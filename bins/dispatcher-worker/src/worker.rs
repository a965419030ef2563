// Pull loop for the test worker

use anyhow::Context;
use dispatch_common::client::DispatcherClient;
use dispatch_common::error::ClientError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::WorkerConfig;
use crate::runner::{TestOutcome, TestRunner};

/// Where the worker gets its next test from.
pub trait TestSource {
    async fn next_test(&self, build_id: &str, test_suite: &str) -> Result<Option<String>, ClientError>;
}

impl TestSource for DispatcherClient {
    async fn next_test(&self, build_id: &str, test_suite: &str) -> Result<Option<String>, ClientError> {
        DispatcherClient::next_test(self, build_id, test_suite).await
    }
}

/// Run tests until the queue is gone or shutdown is requested. The shutdown
/// token is only checked between tests, so a dequeued test always finishes and
/// lands in `outcomes`.
#[instrument(skip_all, fields(build_id = %config.build_id, test_suite = %config.test_suite))]
pub async fn worker_loop<S: TestSource>(
    source: &S,
    runner: &TestRunner,
    config: &WorkerConfig,
    shutdown: &CancellationToken,
    outcomes: &mut Vec<TestOutcome>,
) -> anyhow::Result<()> {
    let mut failures = 0u32;

    loop {
        if shutdown.is_cancelled() {
            warn!(ran = outcomes.len(), "Shutdown requested, not pulling more tests");
            return Ok(());
        }

        let test = match source.next_test(&config.build_id, &config.test_suite).await {
            Ok(Some(test)) => {
                failures = 0;
                test
            }
            Ok(None) => {
                info!("Queue exhausted, no more tests to run");
                return Ok(());
            }
            Err(e) if e.is_transient() && failures < config.max_retries => {
                failures += 1;
                warn!(error = %e, attempt = failures, "Dispatcher unreachable, retrying");
                tokio::time::sleep(config.retry_delay).await;
                continue;
            }
            Err(e) => {
                return Err(e).context("Failed to fetch next test");
            }
        };

        info!(test = %test, "Running test");
        let outcome = runner.run(&test).await?;
        if outcome.passed {
            info!(
                test = %outcome.name,
                duration_ms = outcome.duration.as_millis() as u64,
                "Test passed"
            );
        } else {
            error!(
                test = %outcome.name,
                exit_code = ?outcome.exit_code,
                duration_ms = outcome.duration.as_millis() as u64,
                "Test failed"
            );
        }
        outcomes.push(outcome);
    }
}
