//! # liftlog
//!
//! Command-line consumer of the LiftLog sync engines.
//!
//! ```text
//! liftlog start
//! liftlog add-exercise bench "Bench Press"
//! liftlog add-set bench -r 8 -w 60
//! liftlog finish --name "Push"      # syncs now, or stays pending
//! liftlog --offline rest-day        # saved locally, will sync
//! liftlog sync --wait               # ride out automatic retries
//! ```

mod app;
mod cli;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = app::run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays clean.
///
/// - Default: `liftlog=info,sqlx=warn`
/// - `RUST_LOG=liftlog_sync=debug` - engine internals
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("liftlog=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
