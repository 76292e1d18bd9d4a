//! Shared command-line plumbing for the `napcat-fetch` and `napcat-collect`
//! binaries.
//!
//! Arguments fall back to environment variables. Everything written to
//! stdout is the JSON report; logs and errors go to stderr.

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;
use std::process;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Parser};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{BusConfig, DEFAULT_ENDPOINT};
use crate::error::{Error, Result};
use crate::identifiers::GroupId;
use crate::session::Report;

// ============================================================================
// Constants
// ============================================================================

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "napcat_bus=info";

// ============================================================================
// Arguments
// ============================================================================

/// Connection arguments shared by both binaries.
#[derive(Args, Debug, Clone)]
pub struct BusArgs {
    /// NapCat WebSocket URL
    #[arg(long = "napcat", env = "NAPCAT_URL", default_value = DEFAULT_ENDPOINT)]
    pub napcat: String,

    /// Target group number (required)
    #[arg(long, env = "GROUP_ID")]
    pub group: Option<GroupId>,

    /// Access token appended to the URL
    #[arg(long, env = "NAPCAT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl BusArgs {
    /// Returns the group number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if neither `--group` nor `GROUP_ID` is set.
    pub fn group_id(&self) -> Result<GroupId> {
        self.group
            .ok_or_else(|| Error::config("group id is required (--group or GROUP_ID)"))
    }

    /// Builds the connection configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`BusConfig`].
    pub fn config(&self) -> Result<BusConfig> {
        BusConfig::builder()
            .endpoint(&self.napcat)
            .token_opt(self.token.clone())
            .build()
    }
}

/// Arguments of `napcat-fetch`.
#[derive(Parser, Debug, Clone)]
#[command(name = "napcat-fetch", version)]
#[command(about = "Fetch recent text messages of a QQ group from NapCat as JSON")]
pub struct FetchArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Number of recent messages to request
    #[arg(long, env = "FETCH_COUNT", default_value_t = 50)]
    pub count: u32,
}

impl FetchArgs {
    /// Returns the batch size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero count.
    pub fn count(&self) -> Result<u32> {
        if self.count == 0 {
            return Err(Error::config("count must be at least 1"));
        }
        Ok(self.count)
    }
}

/// Arguments of `napcat-collect`.
#[derive(Parser, Debug, Clone)]
#[command(name = "napcat-collect", version)]
#[command(about = "Collect live text messages of a QQ group from NapCat as JSON")]
pub struct CollectArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Collection window in minutes (fractions allowed)
    #[arg(long, env = "COLLECT_DURATION", default_value_t = 10.0)]
    pub duration: f64,
}

impl CollectArgs {
    /// Returns the collection window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for negative, non-finite or oversized values.
    pub fn window(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.duration * 60.0)
            .map_err(|_| Error::config(format!("invalid duration: {} minutes", self.duration)))
    }
}

// ============================================================================
// Process Helpers
// ============================================================================

/// Parses arguments, exiting on `--help`/`--version` (status 0) or on a
/// usage error (JSON error, status 1).
#[must_use]
pub fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => exit_with_error(e.to_string().trim()),
    }
}

/// Installs the stderr log subscriber.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Writes the report to stdout as pretty JSON.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn print_report(report: &Report) -> Result<()> {
    let rendered = serde_json::to_string_pretty(report)?;
    println!("{rendered}");
    Ok(())
}

/// Writes `{"success": false, "error": ...}` to stderr and exits with 1.
pub fn exit_with_error(message: &str) -> ! {
    eprintln!("{}", json!({ "success": false, "error": message }));
    process::exit(1)
}

/// Resolves on Ctrl+C.
///
/// If the handler cannot be installed the future never resolves, leaving
/// the collection window as the only way out.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt received, finishing collection"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            pending::<()>().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
