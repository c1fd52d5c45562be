// SPDX-License-Identifier: MIT
//! Layered run configuration.
//!
//! Defaults ← optional `a11ysweep.toml` ← CLI flags / environment. Every
//! component receives its slice of the resolved configuration at
//! construction; nothing reads globals after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locale::ImpactLexicon;

/// Config file probed in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "a11ysweep.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config file '{path}' is not valid TOML: {source}")]
    Invalid {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Page emulation profile applied to every page of the run.
///
/// Selected by explicit flag or config key only — never inferred from the
/// shape of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    #[default]
    Desktop,
    /// Phone-sized viewport (375×812) with touch events and the mobile
    /// layout flag.
    Mobile,
}

// ─── RunConfig ────────────────────────────────────────────────────────────────

/// Resolved configuration for one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Text file with one target URL per line.
    pub targets_file: PathBuf,
    /// Maximum number of page cycles in flight at once. 1 = strictly serial
    /// (report rows then follow target-list order).
    pub concurrency: usize,
    pub device: DeviceProfile,
    pub browser: BrowserSection,
    pub settle: SettleConfig,
    pub engine: EngineConfig,
    pub report: ReportSection,
    /// Localized labels substituted for the engine's impact severities.
    pub lexicon: ImpactLexicon,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            targets_file: PathBuf::from("urls.txt"),
            concurrency: 4,
            device: DeviceProfile::Desktop,
            browser: BrowserSection::default(),
            settle: SettleConfig::default(),
            engine: EngineConfig::default(),
            report: ReportSection::default(),
            lexicon: ImpactLexicon::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from `file` if given, otherwise from
    /// `a11ysweep.toml` in the working directory if present, otherwise
    /// defaults.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match file {
            Some(path) => path.to_path_buf(),
            None => {
                let probe = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !probe.exists() {
                    return Ok(Self::default());
                }
                probe
            }
        };
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Invalid {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply CLI/env overrides on top of the file-level configuration.
    pub fn apply_overrides(
        &mut self,
        targets_file: Option<PathBuf>,
        report_path: Option<PathBuf>,
        device: Option<DeviceProfile>,
        concurrency: Option<usize>,
    ) {
        if let Some(path) = targets_file {
            self.targets_file = path;
        }
        if let Some(path) = report_path {
            self.report.path = path;
        }
        if let Some(device) = device {
            self.device = device;
        }
        if let Some(concurrency) = concurrency {
            self.concurrency = concurrency.max(1);
        }
    }
}

// ─── Browser ──────────────────────────────────────────────────────────────────

/// Browser process and navigation settings (`[browser]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Explicit Chromium/Chrome binary. None = let the launcher autodetect.
    pub executable: Option<PathBuf>,
    /// Upper bound on one page navigation. Every network wait is finite.
    pub navigation_timeout_secs: u64,
    /// Budget for the post-navigation network-quiescence probe.
    pub network_idle_timeout_secs: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            executable: None,
            navigation_timeout_secs: 30,
            network_idle_timeout_secs: 10,
        }
    }
}

impl BrowserSection {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }
}

// ─── Settle loop ──────────────────────────────────────────────────────────────

/// Scroll-settle loop budget (`[settle]`).
///
/// The loop stops as soon as the content height stops growing; these bounds
/// guarantee it also stops against a page whose height never converges.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Hard cap on scroll rounds.
    pub max_rounds: u32,
    /// How long one round waits for the content height to grow past its
    /// previous reading before the page is considered settled.
    pub growth_timeout_ms: u64,
    /// Interval between height probes while waiting for growth.
    pub poll_interval_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            growth_timeout_ms: 10_000,
            poll_interval_ms: 250,
        }
    }
}

impl SettleConfig {
    pub fn growth_timeout(&self) -> Duration {
        Duration::from_millis(self.growth_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// Accessibility engine settings (`[engine]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the axe-core bundle injected into every page. Read once at
    /// startup; unreadable is fatal.
    pub script_path: PathBuf,
    /// Optional axe locale bundle (e.g. axe-core's `locales/ja.json`),
    /// applied via `axe.configure` so the engine reports in the operator's
    /// language.
    pub locale_path: Option<PathBuf>,
    /// Rule tags restricting the check set.
    pub tags: Vec<String>,
    /// Extend the tag filter with axe's `best-practice` rules.
    pub best_practices: bool,
    /// Upper bound on one in-page engine run.
    pub run_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("axe.min.js"),
            locale_path: None,
            tags: vec!["wcag2a".to_string(), "wcag21a".to_string()],
            best_practices: false,
            run_timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    /// The tag filter handed to `axe.run`.
    pub fn resolved_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        if self.best_practices && !tags.iter().any(|t| t == "best-practice") {
            tags.push("best-practice".to_string());
        }
        tags
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// Report destination and header (`[report]`). The header is
/// operator-localizable; the column order is fixed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub path: PathBuf,
    pub header: Vec<String>,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("result.csv"),
            header: [
                "URL",
                "Category",
                "Impact",
                "Help",
                "HTML Element",
                "Messages",
                "DOM Element",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_are_sane() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.targets_file, PathBuf::from("urls.txt"));
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.device, DeviceProfile::Desktop);
        assert_eq!(cfg.report.header.len(), 7);
        assert_eq!(cfg.engine.resolved_tags(), vec!["wcag2a", "wcag21a"]);
    }

    #[test]
    fn best_practices_flag_extends_tags_once() {
        let mut engine = EngineConfig::default();
        engine.best_practices = true;
        assert_eq!(
            engine.resolved_tags(),
            vec!["wcag2a", "wcag21a", "best-practice"]
        );
        engine.tags.push("best-practice".to_string());
        assert_eq!(
            engine.resolved_tags(),
            vec!["wcag2a", "wcag21a", "best-practice"]
        );
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            targets_file = "pages.txt"
            device = "mobile"

            [settle]
            max_rounds = 5

            [lexicon]
            serious = "Grave"
            "#
        )
        .unwrap();
        let cfg = RunConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.targets_file, PathBuf::from("pages.txt"));
        assert_eq!(cfg.device, DeviceProfile::Mobile);
        assert_eq!(cfg.settle.max_rounds, 5);
        assert_eq!(cfg.lexicon.serious, "Grave");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.browser.navigation_timeout_secs, 30);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut cfg = RunConfig::default();
        cfg.apply_overrides(
            Some(PathBuf::from("other.txt")),
            Some(PathBuf::from("out.csv")),
            Some(DeviceProfile::Mobile),
            Some(0),
        );
        assert_eq!(cfg.targets_file, PathBuf::from("other.txt"));
        assert_eq!(cfg.report.path, PathBuf::from("out.csv"));
        assert_eq!(cfg.device, DeviceProfile::Mobile);
        // Zero workers would deadlock the pool; clamped to serial.
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "concurrency = \"many\"").unwrap();
        let err = RunConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
