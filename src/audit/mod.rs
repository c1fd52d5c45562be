// SPDX-License-Identifier: MIT
//! Accessibility engine boundary: result model, axe-core invocation, and the
//! per-URL audit cycle.

pub mod engine;
pub mod invoker;
pub mod model;

pub use engine::{AxeEngine, EngineError};
pub use invoker::{BrowserAuditor, UrlAuditor};
pub use model::{AuditSummary, Category, Finding, FindingNode, Impact};
