// Ctrl-C handling for the test worker

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Returns a token cancelled on the first Ctrl-C. The worker checks it between
/// tests; a second Ctrl-C exits immediately.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install CTRL+C handler");
            return;
        }
        warn!("Received shutdown signal, stopping after the current test");
        token_clone.cancel();

        if signal::ctrl_c().await.is_ok() {
            warn!("Second shutdown signal, exiting immediately");
            std::process::exit(130);
        }
    });

    token
}
