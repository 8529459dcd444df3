//! Attention Monitor - Main Entry Point

use clap::Parser;
use monitor::{init_logging, run, Args};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs)?;

    info!("Starting attention-monitor v{}", env!("CARGO_PKG_VERSION"));

    run(args).await
}
