//! Filtering and aggregation over task rows.
//!
//! Everything here is a pure function of its inputs and is recomputed from
//! scratch on every filter action.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::DatasetError;
use crate::task::{Category, Task};

pub const ALL_CATEGORIES: &str = "All";
pub const TOTALS_SERIES: &str = "Totals";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// A category display name, compared case-insensitively.
    Only(String),
}

impl CategoryFilter {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case(ALL_CATEGORIES) {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(input.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(name) => name,
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => task
                .category()
                .is_some_and(|c| c.display_name().to_lowercase() == wanted.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search_text: String,
    pub category: CategoryFilter,
}

impl FilterCriteria {
    pub fn new(search_text: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search_text: search_text.into(),
            category,
        }
    }

    fn matches_text(&self, task: &Task) -> bool {
        if self.search_text.trim().is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        task.id_category.to_string().contains(&needle)
            || task.name.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle)
            || task.owner.to_lowercase().contains(&needle)
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_text(task) && self.category.matches(task)
    }
}

/// Rows that match both the search text and the category, in input order.
pub fn apply_filter(all_rows: &[Task], criteria: &FilterCriteria) -> Vec<Task> {
    all_rows
        .iter()
        .filter(|task| criteria.matches(task))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: u64,
    pub per_category_counts: BTreeMap<Category, u64>,
}

impl Totals {
    /// All known categories at zero.
    pub fn zeroed() -> Self {
        Self {
            total: 0,
            per_category_counts: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }

    pub fn count(&self, category: Category) -> u64 {
        self.per_category_counts.get(&category).copied().unwrap_or(0)
    }
}

impl Default for Totals {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Per-category tally. Rows whose category id is unknown are left out of
/// every count, so `total` can be smaller than `rows.len()`.
pub fn compute_totals(rows: &[Task]) -> Totals {
    let mut totals = Totals::zeroed();
    for category in rows.iter().filter_map(Task::category) {
        if let Some(count) = totals.per_category_counts.get_mut(&category) {
            *count += 1;
        }
    }
    totals.total = totals.per_category_counts.values().sum();
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    x_axis: Vec<String>,
    series: BTreeMap<String, Vec<f64>>,
}

impl ChartDataset {
    pub fn new(
        x_axis: Vec<String>,
        series: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, DatasetError> {
        for (name, values) in &series {
            if values.len() != x_axis.len() {
                return Err(DatasetError::SeriesLength {
                    series: name.clone(),
                    len: values.len(),
                    expected: x_axis.len(),
                });
            }
        }
        Ok(Self { x_axis, series })
    }

    pub fn empty() -> Self {
        Self {
            x_axis: Vec::new(),
            series: BTreeMap::new(),
        }
    }

    pub fn x_axis(&self) -> &[String] {
        &self.x_axis
    }

    pub fn series(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty() || self.series.is_empty()
    }

    /// `(label, value)` pairs of the first series, or nothing when empty.
    pub fn bars(&self) -> Vec<(&str, f64)> {
        match self.series.values().next() {
            Some(values) => self
                .x_axis
                .iter()
                .map(String::as_str)
                .zip(values.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for ChartDataset {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn build_chart_dataset(totals: &Totals) -> ChartDataset {
    let x_axis = Category::ALL
        .iter()
        .map(|c| c.display_name().to_string())
        .collect();
    let values = Category::ALL
        .iter()
        .map(|c| totals.count(*c) as f64)
        .collect();
    ChartDataset {
        x_axis,
        series: BTreeMap::from([(TOTALS_SERIES.to_string(), values)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, "Report", "d", "alice"),
            Task::new(2, "Code", "d2", "bob"),
        ]
    }

    fn mixed() -> Vec<Task> {
        vec![
            Task::new(1, "Write minutes", "weekly meeting", "alice"),
            Task::new(3, "Play chess", "club night", "bob"),
            Task::new(7, "Orphan", "no category", "carol"),
            Task::new(2, "Fix parser", "tokenizer bug", "dave"),
            Task::new(1, "Spreadsheet", "budget", "bob"),
        ]
    }

    #[test]
    fn identity_filter_returns_everything_in_order() {
        let rows = mixed();
        assert_eq!(apply_filter(&rows, &FilterCriteria::default()), rows);
    }

    #[test]
    fn filtering_never_adds_rows() {
        let rows = mixed();
        for search in ["", "  ", "b", "xyz", "1", "BOB"] {
            for category in ["All", "Office", "programming", "Leisure", "Unknown"] {
                let criteria = FilterCriteria::new(search, CategoryFilter::parse(category));
                assert!(apply_filter(&rows, &criteria).len() <= rows.len());
            }
        }
    }

    #[test]
    fn category_filter_selects_programming_row() {
        let rows = sample();
        let criteria = FilterCriteria::new("", CategoryFilter::parse("Programming"));
        let filtered = apply_filter(&rows, &criteria);
        assert_eq!(filtered, vec![rows[1].clone()]);

        let totals = compute_totals(&filtered);
        assert_eq!(totals.count(Category::Office), 0);
        assert_eq!(totals.count(Category::Programming), 1);
        assert_eq!(totals.count(Category::Leisure), 0);
        assert_eq!(totals.total, 1);
    }

    #[test]
    fn category_filter_ignores_case() {
        let criteria = FilterCriteria::new("", CategoryFilter::parse("oFFice"));
        let filtered = apply_filter(&mixed(), &criteria);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|t| t.id_category == 1));
    }

    #[test]
    fn search_matches_description_only() {
        let criteria = FilterCriteria::new("TOKENIZER", CategoryFilter::All);
        let filtered = apply_filter(&mixed(), &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Fix parser");
    }

    #[test]
    fn search_matches_owner_and_category_id() {
        let by_owner = apply_filter(&mixed(), &FilterCriteria::new("bob", CategoryFilter::All));
        assert_eq!(by_owner.len(), 2);

        let by_id = apply_filter(&mixed(), &FilterCriteria::new("7", CategoryFilter::All));
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "Orphan");
    }

    #[test]
    fn whitespace_search_is_ignored() {
        let rows = mixed();
        let filtered = apply_filter(&rows, &FilterCriteria::new("   ", CategoryFilter::All));
        assert_eq!(filtered, rows);
    }

    #[test]
    fn unmapped_category_never_matches_named_filter() {
        for name in ["Office", "Programming", "Leisure"] {
            let criteria = FilterCriteria::new("Orphan", CategoryFilter::parse(name));
            assert!(apply_filter(&mixed(), &criteria).is_empty());
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let criteria = FilterCriteria::new("anything", CategoryFilter::parse("Office"));
        assert!(apply_filter(&[], &criteria).is_empty());
    }

    #[test]
    fn totals_of_nothing_are_zero_for_all_categories() {
        let totals = compute_totals(&[]);
        assert_eq!(totals, Totals::zeroed());
        assert_eq!(totals.per_category_counts.len(), 3);
        assert_eq!(totals.total, 0);
    }

    #[test]
    fn unmapped_rows_are_excluded_from_total() {
        let rows = mixed();
        let totals = compute_totals(&rows);
        assert_eq!(totals.total, 4);
        assert_eq!(rows.len(), 5);
        assert_eq!(totals.total, totals.per_category_counts.values().sum::<u64>());
    }

    #[test]
    fn chart_axis_is_fixed_regardless_of_counts() {
        for rows in [vec![], mixed(), vec![Task::new(3, "a", "b", "c")]] {
            let dataset = build_chart_dataset(&compute_totals(&rows));
            assert_eq!(dataset.x_axis(), ["Office", "Programming", "Leisure"]);
            assert_eq!(dataset.series()[TOTALS_SERIES].len(), 3);
        }
    }

    #[test]
    fn chart_values_follow_totals() {
        let dataset = build_chart_dataset(&compute_totals(&mixed()));
        assert_eq!(dataset.series()[TOTALS_SERIES], vec![2.0, 1.0, 1.0]);
        assert_eq!(dataset.bars()[1], ("Programming", 1.0));
    }

    #[test]
    fn dataset_rejects_misaligned_series() {
        let err = ChartDataset::new(
            vec!["a".into(), "b".into()],
            BTreeMap::from([("Totals".to_string(), vec![1.0])]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DatasetError::SeriesLength {
                series: "Totals".into(),
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn category_filter_parse_recognises_sentinel() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(" Leisure "),
            CategoryFilter::Only("Leisure".into())
        );
    }
}
