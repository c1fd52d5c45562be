// SPDX-License-Identifier: MIT
//! Data model for engine results.
//!
//! Mirrors the JSON shape axe-core returns from `axe.run`: four finding
//! categories, each a list of findings, each finding carrying the affected
//! DOM nodes. Unknown fields in the engine output are ignored on
//! deserialization.

use serde::{Deserialize, Serialize};

/// One engine run over one page, grouped into the four finding categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditSummary {
    pub url: Option<String>,
    pub violations: Vec<Finding>,
    pub incomplete: Vec<Finding>,
    pub inapplicable: Vec<Finding>,
    pub passes: Vec<Finding>,
}

impl AuditSummary {
    pub fn findings(&self, category: Category) -> &[Finding] {
        match category {
            Category::Violations => &self.violations,
            Category::Incomplete => &self.incomplete,
            Category::Inapplicable => &self.inapplicable,
            Category::Passes => &self.passes,
        }
    }

    pub fn findings_mut(&mut self, category: Category) -> &mut Vec<Finding> {
        match category {
            Category::Violations => &mut self.violations,
            Category::Incomplete => &mut self.incomplete,
            Category::Inapplicable => &mut self.inapplicable,
            Category::Passes => &mut self.passes,
        }
    }

    pub fn total_findings(&self) -> usize {
        Category::ALL
            .iter()
            .map(|c| self.findings(*c).len())
            .sum()
    }
}

/// One reported check outcome for one rule against one page.
///
/// `impact` holds one of the four raw severities as reported by the engine,
/// or the localized label once the result has passed through the translator.
/// Passes and inapplicable findings usually carry no impact at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub impact: Option<String>,
    pub help: String,
    pub nodes: Vec<FindingNode>,
}

/// A DOM node affected by a finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindingNode {
    /// HTML snippet of the offending element.
    pub html: String,
    /// CSS selector path to the element.
    pub target: Vec<String>,
    /// Per-node diagnostic messages, as one pre-joined summary.
    pub failure_summary: Option<String>,
}

/// The four finding categories tracked in the report. Fixed set: the
/// translator and the report only ever touch these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Violations,
    Incomplete,
    Inapplicable,
    Passes,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Violations,
        Category::Incomplete,
        Category::Inapplicable,
        Category::Passes,
    ];

    /// Label used in the report's category column.
    pub fn label(self) -> &'static str {
        match self {
            Category::Violations => "violations",
            Category::Incomplete => "incomplete",
            Category::Inapplicable => "inapplicable",
            Category::Passes => "passes",
        }
    }
}

/// Impact severity as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Impact {
    pub const ALL: [Impact; 4] = [
        Impact::Critical,
        Impact::Serious,
        Impact::Moderate,
        Impact::Minor,
    ];

    /// Parse the engine's raw severity string. Anything outside the fixed
    /// set (including already-localized labels) returns `None`.
    pub fn from_raw(raw: &str) -> Option<Impact> {
        match raw {
            "critical" => Some(Impact::Critical),
            "serious" => Some(Impact::Serious),
            "moderate" => Some(Impact::Moderate),
            "minor" => Some(Impact::Minor),
            _ => None,
        }
    }

    pub fn as_raw(self) -> &'static str {
        match self {
            Impact::Critical => "critical",
            Impact::Serious => "serious",
            Impact::Moderate => "moderate",
            Impact::Minor => "minor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_engine_json() {
        let raw = r##"{
            "url": "https://example.com/",
            "violations": [{
                "id": "image-alt",
                "impact": "critical",
                "help": "Images must have alternate text",
                "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/image-alt",
                "nodes": [{
                    "html": "<img src=\"hero.png\">",
                    "target": ["#hero > img"],
                    "failureSummary": "Fix any of the following: ..."
                }]
            }],
            "passes": [{"id": "document-title", "help": "Documents must have a title"}]
        }"##;
        let summary: AuditSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.violations.len(), 1);
        assert_eq!(summary.violations[0].impact.as_deref(), Some("critical"));
        assert_eq!(summary.violations[0].nodes[0].target, vec!["#hero > img"]);
        assert!(summary.passes[0].impact.is_none());
        assert!(summary.incomplete.is_empty());
        assert_eq!(summary.total_findings(), 2);
    }

    #[test]
    fn impact_round_trips_raw_severities() {
        for impact in Impact::ALL {
            assert_eq!(Impact::from_raw(impact.as_raw()), Some(impact));
        }
        assert_eq!(Impact::from_raw("cosmetic"), None);
        assert_eq!(Impact::from_raw(""), None);
    }
}
