use std::{io, path::PathBuf};

use thiserror::Error;

/// A raw row could not be turned into a [`crate::task::Task`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}, found {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("row {index}: {source}")]
    AtRow {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
    #[error("malformed data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("series `{series}` has {len} values but the x axis has {expected} labels")]
    SeriesLength {
        series: String,
        len: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("chart image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}
