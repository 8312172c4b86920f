use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{ConfigError, SourceError};
use crate::report::ReportPaths;
use crate::source::{DataSource, JsonSource, SqliteSource};

pub const CONFIG_FILE: &str = "boletin.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub backend: Backend,
    pub path: PathBuf,
    pub tasks_table: String,
    pub categories_table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            path: PathBuf::from("tasks.json"),
            tasks_table: "tasks".into(),
            categories_table: "categories".into(),
        }
    }
}

impl SourceConfig {
    pub fn open(&self) -> Result<Box<dyn DataSource>, SourceError> {
        debug!(backend = ?self.backend, path = %self.path.display(), "opening data source");
        Ok(match self.backend {
            Backend::Json => Box::new(JsonSource::new(&self.path)),
            Backend::Sqlite => Box::new(SqliteSource::open(&self.path)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Resolved against the working directory when relative.
    pub output_file: PathBuf,
    pub chart_image: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("report_tasks.pdf"),
            chart_image: PathBuf::from("temp_chart.png"),
        }
    }
}

impl ReportConfig {
    pub fn paths(&self, cwd: &Path) -> ReportPaths {
        ReportPaths {
            output: cwd.join(&self.output_file),
            chart_image: self.chart_image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    /// Log file used while the terminal view owns the screen.
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "boletin=info".into(),
            file: PathBuf::from("boletin.log"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path if given, else `boletin.toml` in `cwd`, else the
    /// platform config dir, else defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::candidates(cwd).into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn candidates(cwd: &Path) -> Vec<PathBuf> {
        let mut paths = vec![cwd.join(CONFIG_FILE)];
        if let Some(dirs) = directories::ProjectDirs::from("org", "boletin", "boletin") {
            paths.push(dirs.config_dir().join(CONFIG_FILE));
        }
        paths
    }
}
