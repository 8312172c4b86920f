use serde_json::Value;
use std::{fs, path::PathBuf};
use tracing::debug;

use super::DataSource;
use crate::error::SourceError;
use crate::task::Row;

/// A JSON document of the form `{ "<table>": [ {row}, ... ], ... }`.
///
/// The file is re-read on every fetch so edits show up on the next filter.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Value, SourceError> {
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl DataSource for JsonSource {
    fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, SourceError> {
        let document = self.load()?;
        let rows = document
            .get(table)
            .ok_or_else(|| SourceError::TableNotFound(table.to_string()))?
            .as_array()
            .ok_or_else(|| SourceError::Malformed(format!("table `{table}` is not an array")))?;

        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_object().cloned().ok_or_else(|| {
                    SourceError::Malformed(format!("row {i} of `{table}` is not an object"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table, rows = rows.len(), path = %self.path.display(), "fetched rows");
        Ok(rows)
    }
}
