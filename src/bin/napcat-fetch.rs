//! Fetches a bounded batch of recent group messages and prints a JSON report.
//!
//! Usage:
//!   napcat-fetch --group 123456 --count 50
//!   napcat-fetch --napcat ws://127.0.0.1:3001 --group 123456 --token secret
//!
//! Environment fallbacks: `NAPCAT_URL`, `GROUP_ID`, `FETCH_COUNT`, `NAPCAT_TOKEN`.

// ============================================================================
// Imports
// ============================================================================

use napcat_bus::Result;
use napcat_bus::cli::{self, FetchArgs};
use napcat_bus::flow::fetch_history;

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: FetchArgs = cli::parse_or_exit();
    cli::init_logging();

    if let Err(e) = run(args).await {
        cli::exit_with_error(&e.to_string());
    }
}

async fn run(args: FetchArgs) -> Result<()> {
    let group_id = args.bus.group_id()?;
    let count = args.count()?;
    let config = args.bus.config()?;

    let report = fetch_history(&config, group_id, count).await?;
    cli::print_report(&report)
}
