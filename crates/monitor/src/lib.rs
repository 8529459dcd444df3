//! Attention Monitor
//!
//! Frame-loop front end for the attention tracker. Reads landmark records
//! as JSON lines, feeds them to one tracking session and writes a snapshot
//! per frame as a JSON line on stdout. Logs go to stderr.

pub mod args;
pub mod input;
pub mod session;
pub mod settings;

pub use args::{Args, Preset};
pub use input::InputRecord;
pub use session::ReplaySession;
pub use settings::{CameraSettings, Settings};

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool, json: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// Run the monitor until end of input or Ctrl+C
pub async fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = Settings::load(args.config.as_deref(), args.preset)
        .context("Failed to load settings")?;
    if let Some(threshold) = args.alert_threshold {
        settings.tracker.alert_threshold_seconds = threshold;
    }

    let mut session = ReplaySession::new(&settings)?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!("Replaying landmarks from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Reading landmarks from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let mut lines = reader.lines();
    let mut stdout = tokio::io::stdout();
    let mut line_number = 0u64;
    let mut skipped = 0u64;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                line_number += 1;

                let record = match InputRecord::parse(&line) {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(line = line_number, "Skipping malformed input: {}", e);
                        skipped += 1;
                        continue;
                    }
                };

                if let Some(snapshot) = session.handle(record) {
                    if args.events_only && !snapshot.has_events() {
                        continue;
                    }
                    let mut out = serde_json::to_string(&snapshot)?;
                    out.push('\n');
                    stdout.write_all(out.as_bytes()).await?;
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    stdout.flush().await?;
    if skipped > 0 {
        warn!("Skipped {} malformed line(s)", skipped);
    }
    session.log_summary();
    Ok(())
}
