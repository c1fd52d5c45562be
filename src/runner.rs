// SPDX-License-Identifier: MIT
//! Run orchestration.
//!
//! A run moves through Idle → BrowserLaunching → Running → ShuttingDown →
//! Done. The Running phase dispatches per-URL cycles through a bounded
//! worker pool; a cycle's failure is logged and isolated to its URL. The
//! browser is shut down on every exit path of a started run.

use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::audit::engine::AxeEngine;
use crate::audit::invoker::{BrowserAuditor, UrlAuditor};
use crate::browser::session::BrowserSession;
use crate::config::RunConfig;
use crate::locale::{localize_summary, ImpactLexicon};
use crate::report::CsvReport;
use crate::sources;

/// Outcome counters for a completed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub targets: usize,
    pub audited: usize,
    pub failed: usize,
    pub rows: usize,
}

/// Execute one full run. Errors returned here are fatal startup failures;
/// per-URL failures are absorbed into the summary.
pub async fn run(config: RunConfig) -> Result<RunSummary> {
    // Idle: the target list and the report file must be ready before the
    // browser starts.
    let targets = sources::read_targets(&config.targets_file).await?;
    let report = Arc::new(
        CsvReport::create(&config.report.path, &config.report.header)
            .context("could not prepare report file")?,
    );
    let engine = AxeEngine::from_config(&config.engine)?;
    info!(
        targets = targets.len(),
        report = %config.report.path.display(),
        concurrency = config.concurrency,
        device = ?config.device,
        "run prepared"
    );

    info!(phase = "browser_launching", "starting browser");
    let session = Arc::new(BrowserSession::launch(&config.browser).await?);
    let auditor = Arc::new(BrowserAuditor::new(session.clone(), engine, &config));

    info!(phase = "running", "dispatching targets");
    let summary = run_targets(
        auditor,
        report,
        config.lexicon.clone(),
        targets,
        config.concurrency,
    )
    .await;

    // ShuttingDown: unconditional — run_targets absorbs every per-URL
    // failure, so nothing can skip this.
    info!(phase = "shutting_down", "closing browser");
    session.close().await;

    info!(
        targets = summary.targets,
        audited = summary.audited,
        failed = summary.failed,
        rows = summary.rows,
        "run complete"
    );
    Ok(summary)
}

/// The Running phase: fan targets out through a semaphore-bounded pool of
/// page cycles. Never fails — per-URL errors are logged and counted.
pub async fn run_targets<A>(
    auditor: Arc<A>,
    report: Arc<CsvReport>,
    lexicon: ImpactLexicon,
    targets: Vec<String>,
    concurrency: usize,
) -> RunSummary
where
    A: UrlAuditor + 'static,
{
    let mut summary = RunSummary {
        targets: targets.len(),
        ..RunSummary::default()
    };

    // Strictly serial policy: one cycle at a time, in target-list order, so
    // report rows follow the input file.
    if concurrency <= 1 {
        for url in targets {
            match audit_one(&*auditor, &report, &lexicon, &url).await {
                Ok(rows) => {
                    summary.audited += 1;
                    summary.rows += rows;
                    debug!(url = %url, rows, "cycle complete");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(url = %url, "cycle failed: {e:#}");
                }
            }
        }
        return summary;
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let lexicon = Arc::new(lexicon);
    let mut cycles = JoinSet::new();

    for url in targets {
        let semaphore = semaphore.clone();
        let auditor = auditor.clone();
        let report = report.clone();
        let lexicon = lexicon.clone();
        cycles.spawn(async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| anyhow!("worker pool closed"));
            let outcome = match permit {
                Ok(_permit) => audit_one(&*auditor, &report, &lexicon, &url).await,
                Err(e) => Err(e),
            };
            (url, outcome)
        });
    }

    while let Some(joined) = cycles.join_next().await {
        match joined {
            Ok((url, Ok(rows))) => {
                summary.audited += 1;
                summary.rows += rows;
                debug!(url = %url, rows, "cycle complete");
            }
            Ok((url, Err(e))) => {
                summary.failed += 1;
                error!(url = %url, "cycle failed: {e:#}");
            }
            Err(e) => {
                summary.failed += 1;
                error!("cycle task panicked: {e}");
            }
        }
    }
    summary
}

/// One page cycle: audit, localize, append. The caller logs failures with
/// the offending URL.
async fn audit_one(
    auditor: &dyn UrlAuditor,
    report: &CsvReport,
    lexicon: &ImpactLexicon,
    url: &str,
) -> Result<usize> {
    let summary = auditor.audit(url).await?;
    let localized = localize_summary(lexicon, &summary);
    let rows = report.append(url, &localized).await?;
    Ok(rows)
}
