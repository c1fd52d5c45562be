// SPDX-License-Identifier: MIT
//! axe-core invocation.
//!
//! The engine itself is an external JavaScript bundle: it is read from disk
//! once at startup, injected into each page, configured with the operator's
//! locale and a rule-tag filter, and run against the rendered DOM. This
//! module only configures and consumes it — no rule logic lives here.

use chromiumoxide::Page;
use serde_json::Value;
use thiserror::Error;

use crate::audit::model::AuditSummary;
use crate::config::EngineConfig;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The axe bundle could not be loaded. Fatal: every audit would fail.
    #[error("could not read engine bundle '{path}': {source}")]
    BundleUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read locale bundle '{path}': {source}")]
    LocaleUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("locale bundle '{path}' is not valid JSON: {source}")]
    LocaleInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("in-page evaluation failed: {0}")]
    Evaluation(#[from] chromiumoxide::error::CdpError),
    #[error("engine returned malformed results: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The loaded accessibility engine, shared by all page cycles of a run.
#[derive(Debug)]
pub struct AxeEngine {
    script: String,
    locale: Option<Value>,
    run_call: String,
}

impl AxeEngine {
    /// Load the engine and locale bundles from disk. Called once at
    /// startup; any failure here aborts the run before the browser starts.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, EngineError> {
        let script = std::fs::read_to_string(&cfg.script_path).map_err(|source| {
            EngineError::BundleUnreadable {
                path: cfg.script_path.display().to_string(),
                source,
            }
        })?;

        let locale = match &cfg.locale_path {
            Some(path) => {
                let raw =
                    std::fs::read_to_string(path).map_err(|source| EngineError::LocaleUnreadable {
                        path: path.display().to_string(),
                        source,
                    })?;
                Some(
                    serde_json::from_str(&raw).map_err(|source| EngineError::LocaleInvalid {
                        path: path.display().to_string(),
                        source,
                    })?,
                )
            }
            None => None,
        };

        let tags = serde_json::to_string(&cfg.resolved_tags())?;
        let run_call = format!("axe.run(document, {{runOnly: {{type: 'tag', values: {tags}}}}})");

        Ok(Self {
            script,
            locale,
            run_call,
        })
    }

    /// Inject the engine into `page`, apply the locale, and run the checks.
    /// The returned summary carries the engine's raw impact severities.
    pub async fn analyze(&self, page: &Page) -> Result<AuditSummary, EngineError> {
        page.evaluate(self.script.as_str()).await?;
        if let Some(locale) = &self.locale {
            let configure = format!("axe.configure({{locale: {locale}}})");
            page.evaluate(configure).await?;
        }
        let value = page.evaluate(self.run_call.as_str()).await?;
        Ok(value.into_value::<AuditSummary>()?)
    }
}
