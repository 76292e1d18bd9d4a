//! Collects live group messages for a bounded window and prints a JSON report.
//!
//! Ctrl+C ends the window early; the report then holds whatever was
//! collected so far.
//!
//! Usage:
//!   napcat-collect --group 123456 --duration 10
//!   napcat-collect --napcat ws://127.0.0.1:3001 --group 123456 --duration 0.5
//!
//! Environment fallbacks: `NAPCAT_URL`, `GROUP_ID`, `COLLECT_DURATION`, `NAPCAT_TOKEN`.

// ============================================================================
// Imports
// ============================================================================

use napcat_bus::Result;
use napcat_bus::cli::{self, CollectArgs};
use napcat_bus::flow::collect_messages;

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: CollectArgs = cli::parse_or_exit();
    cli::init_logging();

    if let Err(e) = run(args).await {
        cli::exit_with_error(&e.to_string());
    }
}

async fn run(args: CollectArgs) -> Result<()> {
    let group_id = args.bus.group_id()?;
    let window = args.window()?;
    let config = args.bus.config()?;

    let report = collect_messages(&config, group_id, window, cli::shutdown_signal()).await?;
    cli::print_report(&report)
}
