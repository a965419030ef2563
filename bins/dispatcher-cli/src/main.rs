mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dispatcher-cli")]
#[command(about = "Submit test lists to the test dispatcher and pull tests from it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the longest-first test list of a suite and submit it
    PushList {
        /// Id of the current build
        #[arg(short, long)]
        build_id: String,

        /// Path to the test workspace
        #[arg(short, long)]
        workspace: PathBuf,

        /// Name of the test suite
        #[arg(short = 's', long)]
        test_suite: String,

        /// Names of excluded tests, separated by ':'
        #[arg(short, long, default_value = "")]
        excluded_tests: String,

        /// Test binary to enumerate (defaults to the workspace install)
        #[arg(long)]
        test_binary: Option<PathBuf>,

        /// Print the ordered list instead of submitting it
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Print the next test to run, or an empty line when there is none
    NextTest {
        /// Id of the current build
        #[arg(short, long)]
        build_id: String,

        /// Name of the test suite
        #[arg(short = 's', long)]
        test_suite: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::PushList {
            build_id,
            workspace,
            test_suite,
            excluded_tests,
            test_binary,
            dry_run,
        } => {
            commands::push_list(
                &build_id,
                &workspace,
                &test_suite,
                &excluded_tests,
                test_binary,
                dry_run,
            )
            .await?;
        }
        Commands::NextTest { build_id, test_suite } => {
            commands::next_test(&build_id, &test_suite).await?;
        }
    }

    Ok(())
}
