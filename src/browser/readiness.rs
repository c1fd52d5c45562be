// SPDX-License-Identifier: MIT
//! Page readiness: force lazily-loaded content to render before the engine
//! inspects the DOM.
//!
//! Policy: scroll to the bottom, then wait for the content height to grow
//! past its previous reading. A wait that times out means the page has
//! settled. A hard round cap bounds the whole loop even against a page
//! whose height grows forever — every wait here is finite.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SettleConfig;

/// The two page operations the settle loop needs. Implemented for the live
/// page; test doubles simulate infinite scroll without a browser.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    async fn content_height(&self) -> anyhow::Result<i64>;
    async fn scroll_to_bottom(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl ScrollSurface for Page {
    async fn content_height(&self) -> anyhow::Result<i64> {
        let value = self.evaluate("document.body.scrollHeight").await?;
        Ok(value.into_value::<i64>()?)
    }

    async fn scroll_to_bottom(&self) -> anyhow::Result<()> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }
}

/// How a settle loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleOutcome {
    pub rounds: u32,
    /// True when the height stopped growing; false when the round budget
    /// ran out first.
    pub converged: bool,
    pub final_height: i64,
}

/// Scroll until the content height stops growing or the round budget is
/// exhausted.
pub async fn settle_lazy_content<S: ScrollSurface + ?Sized>(
    surface: &S,
    cfg: &SettleConfig,
) -> anyhow::Result<SettleOutcome> {
    let mut previous = surface.content_height().await?;
    let mut rounds = 0;
    while rounds < cfg.max_rounds {
        rounds += 1;
        surface.scroll_to_bottom().await?;
        match wait_for_growth(surface, previous, cfg).await? {
            Some(next) => previous = next,
            None => {
                return Ok(SettleOutcome {
                    rounds,
                    converged: true,
                    final_height: previous,
                })
            }
        }
    }
    debug!(rounds, "settle loop hit its round budget");
    Ok(SettleOutcome {
        rounds,
        converged: false,
        final_height: previous,
    })
}

/// Poll until the height exceeds `previous` or the growth timeout expires.
async fn wait_for_growth<S: ScrollSurface + ?Sized>(
    surface: &S,
    previous: i64,
    cfg: &SettleConfig,
) -> anyhow::Result<Option<i64>> {
    let deadline = Instant::now() + cfg.growth_timeout();
    loop {
        tokio::time::sleep(cfg.poll_interval()).await;
        let height = surface.content_height().await?;
        if height > previous {
            return Ok(Some(height));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
    }
}

/// Wait for in-page network quiescence: `readyState === 'complete'` and a
/// stable resource count, bounded by `budget`. Best effort — probe failures
/// are logged and swallowed, the audit proceeds either way.
pub async fn wait_for_network_idle(page: &Page, budget: Duration) {
    let timeout_ms = budget.as_millis().min(u128::from(u64::MAX)) as u64;
    let js = format!(
        r#"(async () => {{
            const timeoutMs = {timeout_ms};
            const idleMs = 500;
            const interval = 250;
            const start = Date.now();
            let last = 0;
            let stableMs = 0;
            try {{ last = performance.getEntriesByType('resource').length; }} catch (_) {{}}
            while (Date.now() - start < timeoutMs) {{
                await new Promise(r => setTimeout(r, interval));
                let cur = last;
                try {{ cur = performance.getEntriesByType('resource').length; }} catch (_) {{}}
                if (document.readyState === 'complete' && cur === last) {{
                    stableMs += interval;
                    if (stableMs >= idleMs) return true;
                }} else {{
                    stableMs = 0;
                }}
                last = cur;
            }}
            return false;
        }})()"#
    );

    match page.evaluate(js).await {
        Ok(value) => {
            if value.into_value::<bool>().unwrap_or(false) {
                debug!("network idle reached");
            } else {
                debug!(budget_ms = timeout_ms, "network idle wait exhausted its budget");
            }
        }
        Err(e) => warn!("network idle probe failed: {e}"),
    }
}
