//! Orchestration between the data source, the filter engine, the report
//! renderer and whatever surface displays the result.

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::error::SourceError;
use crate::filter::{
    apply_filter, build_chart_dataset, compute_totals, ChartDataset, FilterCriteria, Totals,
};
use crate::report::{export_report, ReportPaths};
use crate::source::{DataSource, CATEGORY_NAME_COLUMN};
use crate::task::{Category, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Receives human readable status messages.
pub trait Notifier {
    /// `popup` asks the surface to make the message prominent.
    fn notify(&mut self, severity: Severity, message: &str, popup: bool);
}

/// Notifier that only logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, severity: Severity, message: &str, popup: bool) {
        match severity {
            Severity::Info => info!(popup, "{message}"),
            Severity::Error => error!(popup, "{message}"),
        }
    }
}

/// What a display shows after an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub rows: Vec<Task>,
    pub totals: Totals,
    pub chart: ChartDataset,
    pub categories: Vec<Category>,
}

impl ViewState {
    /// Empty table, empty chart, all counts at zero.
    pub fn cleared(categories: Vec<Category>) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }
}

/// User intents a surface can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    FiltersChanged(FilterCriteria),
    ExportRequested,
}

pub struct Controller<S, N> {
    source: S,
    notifier: N,
    tasks_table: String,
    categories_table: String,
    report: ReportPaths,
}

impl<S: DataSource, N: Notifier> Controller<S, N> {
    pub fn new(
        source: S,
        notifier: N,
        tasks_table: impl Into<String>,
        categories_table: impl Into<String>,
        report: ReportPaths,
    ) -> Self {
        Self {
            source,
            notifier,
            tasks_table: tasks_table.into(),
            categories_table: categories_table.into(),
            report,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Initial table, chart, totals and category options.
    pub fn initialize(&mut self) -> ViewState {
        let mut view = match self.load_initial() {
            Ok(Some(view)) => view,
            Ok(None) => {
                let table = self.tasks_table.clone();
                self.notifier.notify(
                    Severity::Info,
                    &format!("No data found in table '{table}'."),
                    false,
                );
                ViewState::default()
            }
            Err(err) => {
                self.fail("Error initializing the view", &err);
                ViewState::default()
            }
        };

        match self.load_categories() {
            Ok(categories) => view.categories = categories,
            Err(err) => self.fail("Error loading categories", &err),
        }
        view
    }

    fn load_initial(&self) -> Result<Option<ViewState>, SourceError> {
        let aggregated = self.source.fetch_aggregated(&self.tasks_table)?;
        if aggregated.is_empty() {
            return Ok(None);
        }
        let rows = aggregated.tasks()?;
        let totals = compute_totals(&rows);
        info!(rows = rows.len(), total = totals.total, "initial view loaded");
        Ok(Some(ViewState {
            chart: aggregated.chart()?,
            totals,
            rows,
            categories: Vec::new(),
        }))
    }

    /// Known categories present in the categories table, in declared order.
    fn load_categories(&self) -> Result<Vec<Category>, SourceError> {
        let rows = self.source.fetch_rows(&self.categories_table)?;
        let mut found: Vec<Category> = rows
            .iter()
            .filter_map(|row| row.get(CATEGORY_NAME_COLUMN)?.as_str())
            .filter_map(Category::from_display_name)
            .collect();
        found.sort();
        found.dedup();
        Ok(found)
    }

    /// Re-fetches the tasks and filters them.
    ///
    /// `None` means the fetch failed; the caller keeps what it was showing.
    pub fn apply_filters(
        &mut self,
        criteria: &FilterCriteria,
        categories: Vec<Category>,
    ) -> Option<ViewState> {
        let all_rows = match self.fetch_tasks() {
            Ok(rows) => rows,
            Err(err) => {
                self.fail("Error applying filters", &err);
                return None;
            }
        };

        if all_rows.is_empty() {
            self.notifier
                .notify(Severity::Info, "No data found to apply filters to.", false);
            return Some(ViewState::cleared(categories));
        }

        let rows = apply_filter(&all_rows, criteria);
        debug!(
            search = %criteria.search_text,
            category = criteria.category.label(),
            matched = rows.len(),
            of = all_rows.len(),
            "filters applied"
        );
        if rows.is_empty() {
            self.notifier.notify(
                Severity::Info,
                "No data found with the applied filters.",
                false,
            );
            return Some(ViewState::cleared(categories));
        }

        let totals = compute_totals(&rows);
        Some(ViewState {
            chart: build_chart_dataset(&totals),
            totals,
            rows,
            categories,
        })
    }

    fn fetch_tasks(&self) -> Result<Vec<Task>, SourceError> {
        let rows = self.source.fetch_rows(&self.tasks_table)?;
        Ok(Task::from_rows(&rows)?)
    }

    /// Writes the given rows and their chart to the configured PDF path.
    pub fn export(&mut self, rows: &[Task]) -> Option<PathBuf> {
        if rows.is_empty() {
            warn!("exporting an empty view");
        }
        let dataset = build_chart_dataset(&compute_totals(rows));
        match export_report(rows, &dataset, &self.report) {
            Ok(path) => {
                self.notifier.notify(
                    Severity::Info,
                    &format!("PDF generated successfully at: {}", path.display()),
                    true,
                );
                Some(path)
            }
            Err(err) => {
                self.notifier.notify(
                    Severity::Error,
                    &format!("Error generating the PDF: {err}"),
                    true,
                );
                None
            }
        }
    }

    /// Runs the handler for `intent` against the displayed `view`.
    pub fn dispatch(&mut self, intent: Intent, view: &mut ViewState) {
        match intent {
            Intent::FiltersChanged(criteria) => {
                if let Some(next) = self.apply_filters(&criteria, view.categories.clone()) {
                    *view = next;
                }
            }
            Intent::ExportRequested => {
                self.export(&view.rows);
            }
        }
    }

    fn fail(&mut self, context: &str, err: &SourceError) {
        self.notifier
            .notify(Severity::Error, &format!("{context}: {err}"), false);
    }
}
