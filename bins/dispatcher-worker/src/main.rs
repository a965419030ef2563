mod config;
mod runner;
mod shutdown;
mod worker;

use anyhow::{bail, Context};
use config::WorkerConfig;
use dispatch_common::client::DispatcherClient;
use dispatch_common::enumerator::GtestEnumerator;
use runner::TestRunner;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Test worker booting...");

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    let client = DispatcherClient::new(&config.client)?;

    let binary = match &config.test_binary {
        Some(path) => path.clone(),
        None => GtestEnumerator::new().binary_path(&config.workspace),
    };
    info!(
        build_id = %config.build_id,
        test_suite = %config.test_suite,
        dispatcher = %client.base_url(),
        binary = %binary.display(),
        "Worker configured"
    );
    let runner = TestRunner::new(binary, config.test_suite.clone());

    let shutdown = shutdown::install_shutdown_handler();

    let mut outcomes = Vec::new();
    let result = worker::worker_loop(&client, &runner, &config, &shutdown, &mut outcomes).await;

    let failed: Vec<&str> = outcomes.iter().filter(|o| !o.passed).map(|o| o.name.as_str()).collect();
    info!(
        ran = outcomes.len(),
        failed = failed.len(),
        busy_secs = outcomes.iter().map(|o| o.duration.as_secs_f64()).sum::<f64>(),
        "Worker shutdown complete"
    );

    result?;
    if !failed.is_empty() {
        bail!("{} test(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
