//! Import diagnostics.
//!
//! This crate turns the artefacts of a pipeline run into a report.
//!
//! # Features
//!
//! - **Phase 1 log**: error, warning and out-of-order caution totals
//! - **Load log**: `Warning:` and `Info:` lines grouped, the rest in order,
//!   object ids linked when the loader vouches for them
//! - **Elapsed time**: the load-log line matching the loader's template
//! - **Marker statistics**: count, empty count and usage per marker
//! - **HTML output**: a self-contained page; write failures are logged, not raised

mod error;
mod html;
mod load_log;
mod reporter;
mod stats;

// === Error Types ===
pub use error::{ReportError, Result};

// === Load Log ===
pub use load_log::{LineKind, LineSegment, LoadLog, LoadLogLine, LogTokens};

// === Report ===
pub use reporter::{DiagnosticReporter, ImportReport, ReportTotals};

// === Statistics ===
pub use stats::{StatsRow, stats_rows};

// === Output ===
pub use html::{render_html, write_report};
