// SPDX-License-Identifier: MIT
//! Browser automation boundary: one headless Chromium process per run,
//! one isolated page per target, plus the page-readiness helpers.

pub mod readiness;
pub mod session;

pub use readiness::{settle_lazy_content, ScrollSurface, SettleOutcome};
pub use session::{BrowserError, BrowserSession};
