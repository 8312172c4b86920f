//! Data access façade: raw rows and pre-aggregated views of named tables.

mod json;
mod sqlite;

pub use json::JsonSource;
pub use sqlite::SqliteSource;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::SourceError;
use crate::filter::{build_chart_dataset, compute_totals, ChartDataset, TOTALS_SERIES};
use crate::task::{Row, Task};

/// Column holding the human readable name in the categories table.
pub const CATEGORY_NAME_COLUMN: &str = "category_display_name";

/// Table rows plus the two chart axes derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedData {
    pub columns: Vec<String>,
    pub data: Vec<Row>,
    pub x_axis: Vec<String>,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl AggregatedData {
    /// Builds the aggregated view of a task table by tallying categories.
    pub fn from_task_rows(data: Vec<Row>) -> Result<Self, SourceError> {
        let tasks = Task::from_rows(&data)?;
        let chart = build_chart_dataset(&compute_totals(&tasks));
        Ok(Self {
            columns: columns_of(&data),
            x_axis: chart.x_axis().to_vec(),
            series: chart.series().clone(),
            data,
        })
    }

    pub fn tasks(&self) -> Result<Vec<Task>, SourceError> {
        Ok(Task::from_rows(&self.data)?)
    }

    pub fn chart(&self) -> Result<ChartDataset, SourceError> {
        Ok(ChartDataset::new(self.x_axis.clone(), self.series.clone())?)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Anything that can hand out rows of a named table.
pub trait DataSource {
    fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, SourceError>;

    fn fetch_aggregated(&self, table: &str) -> Result<AggregatedData, SourceError> {
        AggregatedData::from_task_rows(self.fetch_rows(table)?)
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_rows(table)
    }

    fn fetch_aggregated(&self, table: &str) -> Result<AggregatedData, SourceError> {
        (**self).fetch_aggregated(table)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(table: &str) -> Result<&str, SourceError> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(table)
    } else {
        Err(SourceError::InvalidTableName(table.to_string()))
    }
}

/// Column order of the first row, or the task columns for an empty table.
fn columns_of(data: &[Row]) -> Vec<String> {
    match data.first() {
        Some(row) => row.keys().cloned().collect(),
        None => Task::COLUMNS.iter().map(|c| c.to_string()).collect(),
    }
}

fn totals_series(values: Vec<f64>) -> BTreeMap<String, Vec<f64>> {
    BTreeMap::from([(TOTALS_SERIES.to_string(), values)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_names_must_be_identifiers() {
        assert!(validate_table_name("tasks").is_ok());
        assert!(validate_table_name("_t2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2tasks").is_err());
        assert!(validate_table_name("tasks; DROP TABLE x").is_err());
    }

    #[test]
    fn aggregated_view_counts_categories() {
        let rows: Vec<Row> = [
            json!({"id_category": 1, "name": "a", "description": "", "owner": "x"}),
            json!({"id_category": 1, "name": "b", "description": "", "owner": "x"}),
            json!({"id_category": 3, "name": "c", "description": "", "owner": "y"}),
        ]
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        let view = AggregatedData::from_task_rows(rows).unwrap();
        assert_eq!(view.x_axis, ["Office", "Programming", "Leisure"]);
        assert_eq!(view.series[TOTALS_SERIES], vec![2.0, 0.0, 1.0]);
        assert_eq!(view.tasks().unwrap().len(), 3);
        assert!(view.columns.contains(&"owner".to_string()));
    }

    #[test]
    fn empty_table_still_has_columns() {
        let view = AggregatedData::from_task_rows(Vec::new()).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.columns, Task::COLUMNS);
    }
}
