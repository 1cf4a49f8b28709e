//! Drowsiness Monitor - Main Entry Point

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use monitor::{init_logging, replay, Settings};
use tracing::info;

const USAGE: &str = "usage: drowsiness-monitor <trace.jsonl> [settings.toml]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let trace_path = PathBuf::from(args.next().context(USAGE)?);
    let settings_path = args.next().map(PathBuf::from);

    let settings = Settings::load(settings_path.as_deref()).context("loading settings")?;
    init_logging(&settings)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Replaying {}", trace_path.display());

    let file = File::open(&trace_path)
        .with_context(|| format!("opening trace {}", trace_path.display()))?;
    let summary = replay(&settings, BufReader::new(file)).await?;

    if let Some(severity) = summary.severity {
        info!("Alarm still active at end of trace ({:?})", severity);
    }
    Ok(())
}
