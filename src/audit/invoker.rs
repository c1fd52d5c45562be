// SPDX-License-Identifier: MIT
//! The per-URL audit cycle: navigate, settle, run the engine.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::audit::engine::AxeEngine;
use crate::audit::model::AuditSummary;
use crate::browser::readiness::{settle_lazy_content, wait_for_network_idle};
use crate::browser::session::BrowserSession;
use crate::config::{DeviceProfile, RunConfig, SettleConfig};

/// One full page-audit cycle for one URL. The orchestrator only knows this
/// seam, so tests drive it with a stub instead of a browser.
#[async_trait]
pub trait UrlAuditor: Send + Sync {
    async fn audit(&self, url: &str) -> Result<AuditSummary>;
}

/// The live auditor: navigates a real page and runs the real engine.
pub struct BrowserAuditor {
    session: Arc<BrowserSession>,
    engine: AxeEngine,
    device: DeviceProfile,
    navigation_timeout: Duration,
    network_idle_timeout: Duration,
    engine_timeout: Duration,
    settle: SettleConfig,
}

impl BrowserAuditor {
    pub fn new(session: Arc<BrowserSession>, engine: AxeEngine, cfg: &RunConfig) -> Self {
        Self {
            session,
            engine,
            device: cfg.device,
            navigation_timeout: cfg.browser.navigation_timeout(),
            network_idle_timeout: cfg.browser.network_idle_timeout(),
            engine_timeout: cfg.engine.run_timeout(),
            settle: cfg.settle.clone(),
        }
    }

    async fn audit_page(&self, page: &Page, url: &str) -> Result<AuditSummary> {
        info!(url = %url, "testing");

        // Navigation failure is non-fatal: the audit still runs against
        // whatever DOM rendered.
        match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(url = %url, "connection failed: {e}"),
            Err(_) => warn!(
                url = %url,
                timeout_secs = self.navigation_timeout.as_secs(),
                "navigation timed out"
            ),
        }

        wait_for_network_idle(page, self.network_idle_timeout).await;

        match page.get_title().await {
            Ok(Some(title)) => info!(url = %url, title = %title, "page loaded"),
            Ok(None) => info!(url = %url, "page loaded (no title)"),
            Err(e) => debug!(url = %url, "could not read page title: {e}"),
        }

        let outcome = settle_lazy_content(page, &self.settle)
            .await
            .context("scroll settle failed")?;
        debug!(
            url = %url,
            rounds = outcome.rounds,
            converged = outcome.converged,
            height = outcome.final_height,
            "lazy content settled"
        );

        timeout(self.engine_timeout, self.engine.analyze(page))
            .await
            .map_err(|_| {
                anyhow!(
                    "accessibility engine timed out after {}s",
                    self.engine_timeout.as_secs()
                )
            })?
            .context("accessibility engine failed")
    }
}

#[async_trait]
impl UrlAuditor for BrowserAuditor {
    async fn audit(&self, url: &str) -> Result<AuditSummary> {
        let page = self.session.new_page(self.device).await?;
        let result = self.audit_page(&page, url).await;
        // The page is closed whether the cycle succeeded or not.
        if let Err(e) = page.close().await {
            debug!(url = %url, "page close failed: {e}");
        }
        result
    }
}
