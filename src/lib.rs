//! Task table filtering, per-category tallies and PDF reporting.

pub mod board;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod report;
pub mod source;
pub mod task;
pub mod ui;

pub use board::{Controller, Intent, Notifier, Severity, ViewState};
pub use filter::{apply_filter, build_chart_dataset, compute_totals, CategoryFilter, FilterCriteria};
pub use task::{Category, Task};
