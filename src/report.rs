// SPDX-License-Identifier: MIT
//! CSV report accumulation.
//!
//! One file per run, recreated with its header exactly once at run start.
//! Every finding in every category flattens to one row per affected DOM
//! node; rows are appended in audit completion order. The writer sits
//! behind an async mutex so concurrent page cycles never interleave rows.

use std::fs::File;
use std::path::Path;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::audit::model::{AuditSummary, Category};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not create report file: {0}")]
    Create(#[source] std::io::Error),
    #[error("could not write report row: {0}")]
    Write(#[from] csv::Error),
    #[error("could not flush report file: {0}")]
    Flush(#[source] std::io::Error),
}

/// The run's single report file. Owns the file handle for the run's
/// duration; `append` is the only operation that produces rows.
pub struct CsvReport {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvReport {
    /// Truncate or create the file at `path` and write the header row.
    /// Called exactly once per run, before the browser starts.
    pub fn create(path: &Path, header: &[String]) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(ReportError::Create)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(header)?;
        writer.flush().map_err(ReportError::Flush)?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Flatten every finding of `summary` into report rows for `url`.
    ///
    /// Column order is fixed: URL, category, impact, help, HTML snippet,
    /// messages, DOM selector. A finding with no affected nodes still gets
    /// one row, with the node columns empty. Returns the number of rows
    /// written; the whole batch is flushed before the lock is released, so
    /// no partial rows survive a crash mid-run.
    pub async fn append(&self, url: &str, summary: &AuditSummary) -> Result<usize, ReportError> {
        let mut writer = self.writer.lock().await;
        let mut rows = 0;
        for category in Category::ALL {
            for finding in summary.findings(category) {
                let impact = finding.impact.as_deref().unwrap_or_default();
                if finding.nodes.is_empty() {
                    writer.write_record([
                        url,
                        category.label(),
                        impact,
                        finding.help.as_str(),
                        "",
                        "",
                        "",
                    ])?;
                    rows += 1;
                    continue;
                }
                for node in &finding.nodes {
                    let selector = node.target.join(" ");
                    writer.write_record([
                        url,
                        category.label(),
                        impact,
                        finding.help.as_str(),
                        node.html.as_str(),
                        node.failure_summary.as_deref().unwrap_or_default(),
                        selector.as_str(),
                    ])?;
                    rows += 1;
                }
            }
        }
        writer.flush().map_err(ReportError::Flush)?;
        Ok(rows)
    }
}
