use super::chart::{axis_base, axis_top, bar_center};
use crate::filter::{build_chart_dataset, compute_totals, ChartDataset};
use crate::task::Task;

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

pub const TITLE: &str = "Filtered Tasks Report";
pub const CHART_HEADING: &str = "Data Chart";
pub const NO_DATA_MESSAGE: &str = "No data found with the applied filters.";
pub const CHART_TITLE: &str = "Tasks per category";
pub const EMPTY_CHART_TITLE: &str = "No data available";
pub const VALUE_AXIS_TITLE: &str = "Values";

pub const LABEL_X: f32 = 50.0;
pub const VALUE_X: f32 = 150.0;
pub const TOP: f32 = 750.0;
pub const FIRST_ROW_Y: f32 = 700.0;
pub const BOTTOM_MARGIN: f32 = 50.0;
pub const LINE_PITCH: f32 = 20.0;
pub const RECORD_GAP: f32 = 20.0;

pub const TITLE_SIZE: f32 = 14.0;
pub const BODY_SIZE: f32 = 10.0;
pub const AXIS_SIZE: f32 = 8.0;

pub const CHART_X: f32 = 50.0;
pub const CHART_Y: f32 = 400.0;
pub const CHART_WIDTH: f32 = 500.0;
pub const CHART_HEIGHT: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// A single drawing call, positioned in points from the lower-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        weight: FontWeight,
        size: f32,
        text: String,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub pages: Vec<Page>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP;
    }

    fn text(&mut self, x: f32, y: f32, weight: FontWeight, size: f32, text: impl Into<String>) {
        self.page().ops.push(DrawOp::Text {
            x,
            y,
            weight,
            size,
            text: text.into(),
        });
    }

    fn field(&mut self, label: &str, value: &str) {
        if self.y < BOTTOM_MARGIN {
            self.new_page();
        }
        let y = self.y;
        self.text(LABEL_X, y, FontWeight::Bold, BODY_SIZE, label);
        self.text(VALUE_X, y, FontWeight::Regular, BODY_SIZE, value);
        self.y -= LINE_PITCH;
    }
}

/// Title, category labels and value axis drawn around the chart image.
fn chart_annotations(cursor: &mut Cursor, dataset: &ChartDataset) {
    let bars = dataset.bars();
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let title = if max > 0.0 { CHART_TITLE } else { EMPTY_CHART_TITLE };
    cursor.text(CHART_X, CHART_Y + CHART_HEIGHT + 8.0, FontWeight::Bold, BODY_SIZE, title);

    let base_y = CHART_Y + axis_base() * CHART_HEIGHT;
    let top_y = CHART_Y + axis_top() * CHART_HEIGHT;
    cursor.text(CHART_X - 30.0, top_y + 10.0, FontWeight::Regular, AXIS_SIZE, VALUE_AXIS_TITLE);
    cursor.text(CHART_X - 15.0, base_y, FontWeight::Regular, AXIS_SIZE, "0");
    if max > 0.0 {
        cursor.text(CHART_X - 15.0, top_y - AXIS_SIZE, FontWeight::Regular, AXIS_SIZE, format!("{max}"));
    }

    for (i, (label, _)) in bars.iter().enumerate() {
        let center = CHART_X + bar_center(i, bars.len()) * CHART_WIDTH;
        // Helvetica averages about half an em per glyph
        let half_width = label.len() as f32 * AXIS_SIZE * 0.25;
        cursor.text(center - half_width, CHART_Y + 4.0, FontWeight::Regular, AXIS_SIZE, *label);
    }

    let mut y = CHART_Y - LINE_PITCH;
    for (label, value) in bars {
        cursor.text(CHART_X, y, FontWeight::Regular, BODY_SIZE, format!("{label}: {value}"));
        y -= LINE_PITCH;
    }
}

/// Lays out the title page(s) with one block per task, then a chart page.
///
/// `subtitle` is printed under the title when present (generation time).
pub fn layout_report(rows: &[Task], subtitle: Option<&str>) -> ReportLayout {
    let mut cursor = Cursor {
        pages: vec![Page::default()],
        y: FIRST_ROW_Y,
    };
    cursor.text(LABEL_X, TOP, FontWeight::Bold, TITLE_SIZE, TITLE);
    if let Some(subtitle) = subtitle {
        cursor.text(LABEL_X, TOP - LINE_PITCH, FontWeight::Regular, BODY_SIZE, subtitle);
    }

    if rows.is_empty() {
        cursor.text(LABEL_X, FIRST_ROW_Y, FontWeight::Regular, BODY_SIZE, NO_DATA_MESSAGE);
    } else {
        for task in rows {
            cursor.field("Task name:", &task.name);
            cursor.field("Description:", &task.description);
            cursor.field("Owner:", &task.owner);
            cursor.y -= RECORD_GAP;
        }
    }

    cursor.new_page();
    cursor.text(LABEL_X, TOP, FontWeight::Regular, BODY_SIZE, CHART_HEADING);
    cursor.page().ops.push(DrawOp::Image {
        x: CHART_X,
        y: CHART_Y,
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
    });
    let dataset = build_chart_dataset(&compute_totals(rows));
    chart_annotations(&mut cursor, &dataset);

    ReportLayout {
        title: TITLE.to_string(),
        pages: cursor.pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(n: usize) -> Vec<Task> {
        (0..n)
            .map(|i| Task::new(1 + (i as i64 % 3), format!("task {i}"), format!("desc {i}"), "owner"))
            .collect()
    }

    #[test]
    fn empty_rows_print_no_data_message() {
        let layout = layout_report(&[], None);
        assert_eq!(layout.pages.len(), 2);
        let first: Vec<&str> = layout.pages[0].texts().collect();
        assert_eq!(first, vec![TITLE, NO_DATA_MESSAGE]);
        assert!(!first.contains(&"Task name:"));
    }

    #[test]
    fn each_row_gets_three_labelled_fields() {
        let layout = layout_report(&tasks(2), None);
        let first: Vec<&str> = layout.pages[0].texts().collect();
        assert_eq!(first.iter().filter(|t| **t == "Task name:").count(), 2);
        assert_eq!(first.iter().filter(|t| **t == "Owner:").count(), 2);
        assert!(first.contains(&"desc 1"));

        let label_weights: Vec<FontWeight> = layout.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, weight, .. } if *x == LABEL_X => Some(*weight),
                _ => None,
            })
            .collect();
        assert!(label_weights.iter().all(|w| *w == FontWeight::Bold));
    }

    #[test]
    fn fields_advance_by_pitch_and_records_by_gap() {
        let layout = layout_report(&tasks(2), None);
        let ys: Vec<f32> = layout.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, .. } if *x == VALUE_X => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![700.0, 680.0, 660.0, 620.0, 600.0, 580.0]);
    }

    #[test]
    fn long_lists_spill_onto_new_pages() {
        let layout = layout_report(&tasks(40), None);
        // two or more row pages plus the chart page
        assert!(layout.pages.len() >= 3);
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= BOTTOM_MARGIN - LINE_PITCH * 4.0);
                }
            }
        }
        let second_page_first_y = layout.pages[1].ops.iter().find_map(|op| match op {
            DrawOp::Text { y, .. } => Some(*y),
            _ => None,
        });
        assert_eq!(second_page_first_y, Some(TOP));
        let names: usize = layout
            .pages
            .iter()
            .map(|p| p.texts().filter(|t| *t == "Task name:").count())
            .sum();
        assert_eq!(names, 40);
    }

    #[test]
    fn no_field_is_written_below_the_margin() {
        let layout = layout_report(&tasks(60), None);
        let last = layout.pages.len() - 1;
        for page in &layout.pages[..last] {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= BOTTOM_MARGIN - LINE_PITCH);
                }
            }
        }
    }

    #[test]
    fn chart_page_carries_title_axis_and_category_labels() {
        let layout = layout_report(&tasks(4), None);
        let last = layout.pages.last().unwrap();
        let labels: Vec<(f32, &str)> = last
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, size, text, .. }
                    if *size == AXIS_SIZE && *y == CHART_Y + 4.0 =>
                {
                    Some((*x, text.as_str()))
                }
                _ => None,
            })
            .collect();
        let names: Vec<&str> = labels.iter().map(|(_, t)| *t).collect();
        assert_eq!(names, ["Office", "Programming", "Leisure"]);
        assert!(labels.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(labels.iter().all(|(x, _)| *x > CHART_X && *x < CHART_X + CHART_WIDTH));

        assert!(last.texts().any(|t| t == CHART_TITLE));
        assert!(last.texts().any(|t| t == VALUE_AXIS_TITLE));
        // tasks(4) puts two rows in Office
        assert!(last.texts().any(|t| t == "2"));
    }

    #[test]
    fn empty_chart_is_titled_as_such() {
        let layout = layout_report(&[], None);
        let last = layout.pages.last().unwrap();
        assert!(last.texts().any(|t| t == EMPTY_CHART_TITLE));
        assert!(!last.texts().any(|t| t == CHART_TITLE));
    }

    #[test]
    fn chart_page_is_last_with_fixed_box() {
        for rows in [tasks(0), tasks(5)] {
            let layout = layout_report(&rows, Some("generated"));
            let last = layout.pages.last().unwrap();
            assert!(last.has_image());
            assert!(last.ops.contains(&DrawOp::Image {
                x: 50.0,
                y: 400.0,
                width: 500.0,
                height: 300.0
            }));
            assert!(last.texts().any(|t| t == CHART_HEADING));
            assert!(last.texts().any(|t| t.starts_with("Office: ")));
            assert_eq!(layout.pages.iter().filter(|p| p.has_image()).count(), 1);
        }
    }
}
