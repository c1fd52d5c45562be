// SPDX-License-Identifier: MIT
//! Impact-severity localization.
//!
//! The engine reports impact as one of four fixed severities. The report is
//! read by people, so each severity is substituted with a label in the
//! operator's language before a row is written. The substitution is
//! shape-aware: only the impact field of findings in the four known
//! categories is touched, never help text, URLs, or node markup.

use serde::{Deserialize, Serialize};

use crate::audit::model::{AuditSummary, Category, Impact};

/// Localized labels for the four impact severities (`[lexicon]` in the
/// config file). Total: every severity has exactly one label.
///
/// The defaults are the Japanese labels the tool has always shipped with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactLexicon {
    pub critical: String,
    pub serious: String,
    pub moderate: String,
    pub minor: String,
}

impl Default for ImpactLexicon {
    fn default() -> Self {
        Self {
            critical: "緊急 (Critical)".to_string(),
            serious: "深刻 (Serious)".to_string(),
            moderate: "普通 (Moderate)".to_string(),
            minor: "軽微 (Minor)".to_string(),
        }
    }
}

impl ImpactLexicon {
    pub fn label(&self, impact: Impact) -> &str {
        match impact {
            Impact::Critical => &self.critical,
            Impact::Serious => &self.serious,
            Impact::Moderate => &self.moderate,
            Impact::Minor => &self.minor,
        }
    }

    /// Localize a raw severity string. Returns `None` for anything outside
    /// the fixed set — including labels that were already localized, which
    /// makes repeated localization a no-op.
    pub fn localize_raw(&self, raw: &str) -> Option<&str> {
        Impact::from_raw(raw).map(|impact| self.label(impact))
    }
}

/// Produce a copy of `summary` with every impact field rewritten through the
/// lexicon. The input is left untouched; findings without an impact value
/// pass through unchanged.
pub fn localize_summary(lexicon: &ImpactLexicon, summary: &AuditSummary) -> AuditSummary {
    let mut localized = summary.clone();
    for category in Category::ALL {
        for finding in localized.findings_mut(category) {
            if let Some(label) = finding
                .impact
                .as_deref()
                .and_then(|raw| lexicon.localize_raw(raw))
            {
                finding.impact = Some(label.to_string());
            }
        }
    }
    localized
}
