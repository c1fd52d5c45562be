// SPDX-License-Identifier: MIT
//! Headless browser lifecycle over the DevTools protocol.
//!
//! One Chromium process is shared by all page cycles of a run; each cycle
//! creates and exclusively owns its own page. The CDP event handler is
//! drained by a background task for the lifetime of the session.

use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::page::SetBypassCspParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{BrowserSection, DeviceProfile};

/// Mobile emulation viewport, matching the phone profile the tool has
/// always used (375×812 @3x with touch).
const MOBILE_VIEWPORT: (i64, i64) = (375, 812);
const MOBILE_SCALE_FACTOR: f64 = 3.0;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started. Fatal to the run.
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("could not open page: {0}")]
    Page(String),
    #[error("device emulation setup failed: {0}")]
    Emulation(String),
}

/// A running headless Chromium process.
pub struct BrowserSession {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch headless Chromium and start draining its CDP event stream.
    pub async fn launch(cfg: &BrowserSection) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .args(["--disable-gpu", "--disable-dev-shm-usage"]);
        if let Some(executable) = &cfg.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler event error: {e}");
                }
            }
            debug!("browser event stream closed");
        });

        info!("headless browser launched");
        Ok(Self {
            browser: Mutex::new(browser),
            handler_task,
        })
    }

    /// Open an isolated page with CSP bypassed (so the injected engine
    /// script runs on pages with restrictive policies) and the device
    /// profile applied.
    pub async fn new_page(&self, device: DeviceProfile) -> Result<Page, BrowserError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))?;

        page.execute(SetBypassCspParams::new(true))
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))?;

        if device == DeviceProfile::Mobile {
            apply_mobile_profile(&page).await?;
        }
        Ok(page)
    }

    /// Shut the browser down and stop the event drain task. Invoked
    /// unconditionally at the end of every started run.
    pub async fn close(&self) {
        if let Err(e) = self.browser.lock().await.close().await {
            warn!("browser close failed: {e}");
        }
        self.handler_task.abort();
        info!("browser shut down");
    }
}

async fn apply_mobile_profile(page: &Page) -> Result<(), BrowserError> {
    let (width, height) = MOBILE_VIEWPORT;
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(width)
        .height(height)
        .device_scale_factor(MOBILE_SCALE_FACTOR)
        .mobile(true)
        .build()
        .map_err(BrowserError::Emulation)?;
    page.execute(metrics)
        .await
        .map_err(|e| BrowserError::Emulation(e.to_string()))?;
    page.execute(SetTouchEmulationEnabledParams::new(true))
        .await
        .map_err(|e| BrowserError::Emulation(e.to_string()))?;
    debug!("mobile device profile applied");
    Ok(())
}
