use std::{fs::OpenOptions, path::Path, sync::Once};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

static TRACING_INIT: Once = Once::new();

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initializes the global subscriber writing to stderr.
pub fn init_stderr(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        fmt()
            .with_env_filter(env_filter(&config.filter))
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Initializes the global subscriber appending to `config.file`, so log
/// lines never land on a screen owned by the terminal view.
pub fn init_file(config: &LoggingConfig) -> std::io::Result<()> {
    let file = open_log(&config.file)?;
    TRACING_INIT.call_once(|| {
        fmt()
            .with_env_filter(env_filter(&config.filter))
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    });
    Ok(())
}

fn open_log(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}
