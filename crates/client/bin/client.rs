//! Terminal client for the interview server.
//!
//! Loads configuration, sets up logging on stderr (stdout belongs to the
//! conversation) and runs the event loop until the user quits.

use anyhow::Context;
use clap::Parser;
use interview_client::{config::Config, runtime};
use std::time::Duration;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(version, about = "Chat with the interview server from your terminal")]
struct Args {
    /// WebSocket endpoint, overriding SERVER_URL.
    #[arg(long)]
    url: Option<String>,

    /// Log level, overriding RUST_LOG.
    #[arg(long)]
    log_level: Option<Level>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = args.url {
        config.server_url = url;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded.");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build the async runtime")?;
    let result = rt.block_on(runtime::run(config));
    // A blocked stdin read would otherwise hold up shutdown.
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}
