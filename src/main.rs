use anyhow::{Context, Result};
use boletin::{
    board::{Controller, LogNotifier, Notifier, Severity},
    config::{Backend, Config},
    filter::{CategoryFilter, FilterCriteria},
    logging,
    source::DataSource,
    task::Category,
    ui::{self, ReportScreen, StatusLine},
};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "boletin", version, about = "Filter tasks, tally categories and export PDF reports")]
struct Cli {
    /// Config file (defaults to ./boletin.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data file, overriding the configured source path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Text searched in name, description, owner and category id
    #[arg(long, short, default_value = "")]
    search: String,

    /// "All" or a category name
    #[arg(long, short, default_value = "All")]
    category: String,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.search.clone(), CategoryFilter::parse(&self.category))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal view
    Tui,
    /// Print the filtered rows and the per-category totals
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered rows to a PDF report
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Logs everything and echoes prominent messages to stderr.
struct CliNotifier {
    errors: usize,
}

impl Notifier for CliNotifier {
    fn notify(&mut self, severity: Severity, message: &str, popup: bool) {
        LogNotifier.notify(severity, message, popup);
        if severity == Severity::Error {
            self.errors += 1;
        }
        if popup || severity == Severity::Error {
            eprintln!("{message}");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("reading the working directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd).context("loading configuration")?;
    if let Some(data) = cli.data {
        config.source.path = data;
    }
    if let Some(backend) = cli.backend {
        config.source.backend = backend;
    }

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            logging::init_file(&config.logging).context("opening the log file")?;
            run_tui(&config, &cwd)
        }
        Command::Summary { filter, json } => {
            logging::init_stderr(&config.logging);
            run_summary(&config, &cwd, &filter, json)
        }
        Command::Export { filter, output } => {
            logging::init_stderr(&config.logging);
            if let Some(output) = output {
                config.report.output_file = output;
            }
            run_export(&config, &cwd, &filter)
        }
    }
}

fn controller<N: Notifier>(
    config: &Config,
    cwd: &std::path::Path,
    notifier: N,
) -> Result<Controller<Box<dyn DataSource>, N>> {
    let source = config.source.open().context("opening the data source")?;
    Ok(Controller::new(
        source,
        notifier,
        config.source.tasks_table.clone(),
        config.source.categories_table.clone(),
        config.report.paths(cwd),
    ))
}

fn run_tui(config: &Config, cwd: &std::path::Path) -> Result<()> {
    let mut controller = controller(config, cwd, StatusLine::default())?;
    let mut screen = ReportScreen::new(controller.initialize());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut controller, &mut screen);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.context("running the terminal view")
}

fn filtered(
    controller: &mut Controller<Box<dyn DataSource>, CliNotifier>,
    filter: &FilterArgs,
) -> Result<boletin::ViewState> {
    controller
        .apply_filters(&filter.criteria(), Category::ALL.to_vec())
        .ok_or_else(|| anyhow::anyhow!("could not read tasks"))
}

fn run_summary(config: &Config, cwd: &std::path::Path, filter: &FilterArgs, json: bool) -> Result<()> {
    let mut controller = controller(config, cwd, CliNotifier { errors: 0 })?;
    let view = filtered(&mut controller, filter)?;

    if json {
        let out = serde_json::json!({
            "rows": view.rows,
            "totals": view.totals,
            "chart": view.chart,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for task in &view.rows {
        println!(
            "[{}] {} | {} | {}",
            task.category().map(|c| c.display_name()).unwrap_or("?"),
            task.name,
            task.description,
            task.owner
        );
    }
    let counts = Category::ALL
        .iter()
        .map(|c| format!("{}: {}", c, view.totals.count(*c)))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Total items: {} | {}", view.totals.total, counts);
    Ok(())
}

fn run_export(config: &Config, cwd: &std::path::Path, filter: &FilterArgs) -> Result<()> {
    let mut controller = controller(config, cwd, CliNotifier { errors: 0 })?;
    let view = filtered(&mut controller, filter)?;
    controller.export(&view.rows);
    if controller.notifier().errors > 0 {
        anyhow::bail!("export failed");
    }
    Ok(())
}
