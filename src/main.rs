// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::warn;

use a11ysweep::config::{DeviceProfile, RunConfig};
use a11ysweep::runner;

#[derive(Parser)]
#[command(
    name = "a11ysweep",
    about = "Batch accessibility audit runner — headless Chromium + axe-core, CSV reports",
    version
)]
struct Args {
    /// Text file with one target URL per line
    #[arg(long, env = "A11YSWEEP_URLS")]
    urls_file: Option<std::path::PathBuf>,

    /// CSV report destination (recreated at the start of every run)
    #[arg(long, short = 'o', env = "A11YSWEEP_OUTPUT")]
    output: Option<std::path::PathBuf>,

    /// Device emulation profile applied to every page
    #[arg(long, env = "A11YSWEEP_DEVICE", value_enum)]
    device: Option<DeviceProfile>,

    /// Maximum page cycles in flight at once (1 = strictly serial)
    #[arg(long, short = 'j', env = "A11YSWEEP_CONCURRENCY")]
    concurrency: Option<usize>,

    /// TOML config file (default: ./a11ysweep.toml when present)
    #[arg(long, env = "A11YSWEEP_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "A11YSWEEP_LOG", default_value = "info")]
    log: String,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "A11YSWEEP_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Log format: "pretty" (human-readable) or "json" (for aggregators)
    #[arg(long, env = "A11YSWEEP_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = setup_logging(&args.log, args.log_file.as_deref(), &args.log_format);

    let mut config = RunConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.urls_file, args.output, args.device, args.concurrency);

    // Fatal startup failures exit non-zero; per-URL failures do not.
    let summary = runner::run(config).await.context("run aborted")?;
    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            "some targets produced no report rows; see log for details"
        );
    }
    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("a11ysweep.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
