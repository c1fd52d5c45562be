//! End-to-end orchestration tests against a stub auditor — no browser, no
//! engine bundle, just the real pool, translator, and report writer.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use a11ysweep::audit::{AuditSummary, Finding, FindingNode, UrlAuditor};
use a11ysweep::config::ReportSection;
use a11ysweep::locale::ImpactLexicon;
use a11ysweep::report::CsvReport;
use a11ysweep::runner::run_targets;

/// Returns a canned summary per URL; URLs mapped to `None` fail the cycle.
struct ScriptedAuditor {
    outcomes: HashMap<String, Option<AuditSummary>>,
}

#[async_trait]
impl UrlAuditor for ScriptedAuditor {
    async fn audit(&self, url: &str) -> Result<AuditSummary> {
        match self.outcomes.get(url) {
            Some(Some(summary)) => Ok(summary.clone()),
            Some(None) => Err(anyhow!("navigation timed out")),
            None => Ok(AuditSummary::default()),
        }
    }
}

fn serious_violation() -> AuditSummary {
    let mut summary = AuditSummary::default();
    summary.violations.push(Finding {
        id: "image-alt".to_string(),
        impact: Some("serious".to_string()),
        help: "Images must have alternate text".to_string(),
        nodes: vec![FindingNode {
            html: "<img src=\"hero.png\">".to_string(),
            target: vec!["#hero > img".to_string()],
            failure_summary: Some("Element does not have an alt attribute".to_string()),
        }],
    });
    summary
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn report_at(dir: &tempfile::TempDir) -> (Arc<CsvReport>, std::path::PathBuf) {
    let path = dir.path().join("result.csv");
    let report = CsvReport::create(&path, &ReportSection::default().header).unwrap();
    (Arc::new(report), path)
}

#[tokio::test]
async fn one_violation_yields_exactly_one_localized_row() {
    let dir = tempfile::tempdir().unwrap();
    let (report, path) = report_at(&dir);
    let auditor = Arc::new(ScriptedAuditor {
        outcomes: HashMap::from([
            (
                "https://example.com/a".to_string(),
                Some(serious_violation()),
            ),
            ("https://example.com/b".to_string(), Some(AuditSummary::default())),
        ]),
    });

    let summary = run_targets(
        auditor,
        report,
        ImpactLexicon::default(),
        vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ],
        1,
    )
    .await;

    assert_eq!(summary.targets, 2);
    assert_eq!(summary.audited, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.rows, 1);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 2, "header plus exactly one data row");
    assert_eq!(rows[1][0], "https://example.com/a");
    assert_eq!(rows[1][1], "violations");
    assert_eq!(rows[1][2], "深刻 (Serious)");
}

#[tokio::test]
async fn a_failing_target_does_not_block_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let (report, path) = report_at(&dir);
    let auditor = Arc::new(ScriptedAuditor {
        outcomes: HashMap::from([
            ("https://example.com/ok".to_string(), Some(serious_violation())),
            ("https://example.com/broken".to_string(), None),
            (
                "https://example.com/also-ok".to_string(),
                Some(serious_violation()),
            ),
        ]),
    });

    let summary = run_targets(
        auditor,
        report,
        ImpactLexicon::default(),
        vec![
            "https://example.com/ok".to_string(),
            "https://example.com/broken".to_string(),
            "https://example.com/also-ok".to_string(),
        ],
        1,
    )
    .await;

    assert_eq!(summary.audited, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rows, 2);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|row| row[0] != "https://example.com/broken"));
}

#[tokio::test]
async fn empty_target_list_yields_a_header_only_report() {
    let dir = tempfile::tempdir().unwrap();
    let (report, path) = report_at(&dir);
    let auditor = Arc::new(ScriptedAuditor {
        outcomes: HashMap::new(),
    });

    let summary = run_targets(auditor, report, ImpactLexicon::default(), Vec::new(), 4).await;

    assert_eq!(summary.targets, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(read_rows(&path).len(), 1);
}

#[tokio::test]
async fn serial_policy_preserves_target_order_in_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let (report, path) = report_at(&dir);
    let urls: Vec<String> = (0..5)
        .map(|i| format!("https://example.com/{i}"))
        .collect();
    let outcomes = urls
        .iter()
        .map(|u| (u.clone(), Some(serious_violation())))
        .collect();
    let auditor = Arc::new(ScriptedAuditor { outcomes });

    run_targets(auditor, report, ImpactLexicon::default(), urls.clone(), 1).await;

    let rows = read_rows(&path);
    let row_urls: Vec<&str> = rows[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(row_urls, urls.iter().map(String::as_str).collect::<Vec<_>>());
}

/// Tracks how many audits run at once; every audit holds its slot briefly.
struct GaugeAuditor {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl UrlAuditor for GaugeAuditor {
    async fn audit(&self, _url: &str) -> Result<AuditSummary> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(AuditSummary::default())
    }
}

#[tokio::test]
async fn the_worker_pool_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let (report, _path) = report_at(&dir);
    let auditor = Arc::new(GaugeAuditor {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let urls: Vec<String> = (0..12)
        .map(|i| format!("https://example.com/{i}"))
        .collect();

    let summary = run_targets(
        auditor.clone(),
        report,
        ImpactLexicon::default(),
        urls,
        3,
    )
    .await;

    assert_eq!(summary.audited, 12);
    assert!(
        auditor.peak.load(Ordering::SeqCst) <= 3,
        "no more than three cycles may run at once"
    );
}
