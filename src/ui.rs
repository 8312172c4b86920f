use crate::board::{Controller, Intent, Notifier, Severity, ViewState};
use crate::filter::{CategoryFilter, FilterCriteria, ALL_CATEGORIES};
use crate::source::DataSource;
use crate::task::{Category, Task};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::{debug, error, info};

/// Latest notification, shown in the bottom line.
#[derive(Debug, Default)]
pub struct StatusLine {
    pub current: Option<(Severity, String, bool)>,
}

impl Notifier for StatusLine {
    fn notify(&mut self, severity: Severity, message: &str, popup: bool) {
        match severity {
            Severity::Info => info!(popup, "{message}"),
            Severity::Error => error!(popup, "{message}"),
        }
        self.current = Some((severity, message.to_string(), popup));
    }
}

/// Input widgets and the last view the controller produced.
#[derive(Debug, Default)]
pub struct ReportScreen {
    pub view: ViewState,
    pub search: String,
    /// 0 is "All", then `view.categories` in order.
    pub category_index: usize,
    pub table: TableState,
}

impl ReportScreen {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn category_options(&self) -> Vec<&str> {
        std::iter::once(ALL_CATEGORIES)
            .chain(self.view.categories.iter().map(|c| c.display_name()))
            .collect()
    }

    pub fn selected_category(&self) -> &str {
        let options = self.category_options();
        options[self.category_index.min(options.len() - 1)]
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.search.clone(), CategoryFilter::parse(self.selected_category()))
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let count = self.category_options().len();
        self.category_index = if forward {
            (self.category_index + 1) % count
        } else {
            (self.category_index + count - 1) % count
        };
    }

    fn scroll(&mut self, down: bool) {
        let len = self.view.rows.len();
        if len == 0 {
            self.table.select(None);
            return;
        }
        let current = self.table.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table.select(Some(next));
    }
}

/// What a key press asks for.
#[derive(Debug, PartialEq)]
pub enum Action {
    Dispatch(Intent),
    Quit,
    None,
}

pub fn handle_key(screen: &mut ReportScreen, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('p') if ctrl => Action::Dispatch(Intent::ExportRequested),
        KeyCode::Enter => Action::Dispatch(Intent::FiltersChanged(screen.criteria())),
        KeyCode::Tab => {
            screen.cycle_category(true);
            Action::None
        }
        KeyCode::BackTab => {
            screen.cycle_category(false);
            Action::None
        }
        KeyCode::Backspace => {
            screen.search.pop();
            Action::None
        }
        KeyCode::Up => {
            screen.scroll(false);
            Action::None
        }
        KeyCode::Down => {
            screen.scroll(true);
            Action::None
        }
        KeyCode::Char(c) if !ctrl => {
            screen.search.push(c);
            Action::None
        }
        _ => Action::None,
    }
}

pub fn run_app<B: Backend, S: DataSource>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller<S, StatusLine>,
    screen: &mut ReportScreen,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, screen, controller.notifier()))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match handle_key(screen, key) {
                Action::Quit => return Ok(()),
                Action::Dispatch(intent) => {
                    debug!(?intent, "dispatching");
                    controller.dispatch(intent, &mut screen.view);
                    screen.table.select(None);
                    let options = screen.category_options().len();
                    screen.category_index = screen.category_index.min(options - 1);
                }
                Action::None => {}
            }
        }
    }
}

pub fn draw(f: &mut Frame, screen: &mut ReportScreen, status: &StatusLine) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_filters(f, screen, chunks[0]);
    draw_table(f, screen, chunks[1]);
    f.render_widget(Paragraph::new(summary_line(screen)), chunks[2]);
    draw_chart(f, screen, chunks[3]);
    f.render_widget(Paragraph::new(status_line(status)), chunks[4]);
}

fn draw_filters(f: &mut Frame, screen: &ReportScreen, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let search = Paragraph::new(Line::from(vec![
        Span::raw(screen.search.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(Block::default().title("Search").borders(Borders::ALL));
    f.render_widget(search, halves[0]);

    let category = Paragraph::new(Line::from(vec![
        Span::styled(
            screen.selected_category(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  (Tab)"),
    ]))
    .block(Block::default().title("Category").borders(Borders::ALL));
    f.render_widget(category, halves[1]);
}

fn draw_table(f: &mut Frame, screen: &mut ReportScreen, area: Rect) {
    let header = Row::new(Task::COLUMNS.to_vec())
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = screen
        .view
        .rows
        .iter()
        .map(|task| Row::new(Task::COLUMNS.iter().map(|c| task.cell(c)).collect::<Vec<_>>()))
        .collect();
    let widths = [
        Constraint::Length(12),
        Constraint::Percentage(30),
        Constraint::Percentage(45),
        Constraint::Percentage(25),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title("Tasks").borders(Borders::ALL))
        .row_highlight_style(Style::default().fg(Color::Cyan));
    f.render_stateful_widget(table, area, &mut screen.table);
}

fn summary_line(screen: &ReportScreen) -> Line<'static> {
    let totals = &screen.view.totals;
    let counts = Category::ALL
        .iter()
        .map(|c| format!("{}: {}", c, totals.count(*c)))
        .collect::<Vec<_>>()
        .join(", ");
    Line::from(format!("Total items: {} | {}", totals.total, counts))
}

fn draw_chart(f: &mut Frame, screen: &ReportScreen, area: Rect) {
    let chart = &screen.view.chart;
    let block = Block::default().borders(Borders::ALL);
    if chart.is_empty() {
        f.render_widget(
            Paragraph::new("No data available").block(block.title("Chart")),
            area,
        );
        return;
    }
    let bars: Vec<Bar> = chart
        .bars()
        .into_iter()
        .map(|(label, value)| {
            Bar::default()
                .value(value as u64)
                .label(Line::from(label.to_string()))
        })
        .collect();
    let title = chart
        .series()
        .keys()
        .next()
        .cloned()
        .unwrap_or_default();
    let widget = BarChart::default()
        .block(block.title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Yellow));
    f.render_widget(widget, area);
}

fn status_line(status: &StatusLine) -> Line<'static> {
    let help = "Enter: filter  Tab: category  Ctrl-P: PDF  Esc: quit";
    match &status.current {
        Some((severity, message, popup)) => {
            let mut style = match severity {
                Severity::Info => Style::default().fg(Color::Green),
                Severity::Error => Style::default().fg(Color::Red),
            };
            if *popup {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }
            Line::from(Span::styled(message.clone(), style))
        }
        None => Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
    }
}
