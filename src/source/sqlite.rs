use rusqlite::{types::ValueRef, Connection, OpenFlags};
use serde_json::{Number, Value};
use std::path::Path;
use tracing::debug;

use super::{columns_of, totals_series, validate_table_name, AggregatedData, DataSource};
use crate::error::SourceError;
use crate::task::{Category, Row};

/// Relational backend reading tables out of a SQLite database.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

impl DataSource for SqliteSource {
    fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, SourceError> {
        let table = validate_table_name(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {table}"))
            .map_err(|err| match err {
                rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("no such table") => {
                    SourceError::TableNotFound(table.to_string())
                }
                other => SourceError::Sqlite(other),
            })?;
        let names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            out.push(record);
        }
        debug!(table, rows = out.len(), "fetched rows from sqlite");
        Ok(out)
    }

    fn fetch_aggregated(&self, table: &str) -> Result<AggregatedData, SourceError> {
        let data = self.fetch_rows(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id_category, COUNT(*) FROM {table} GROUP BY id_category"
        ))?;
        let grouped = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let values = Category::ALL
            .iter()
            .map(|category| {
                grouped
                    .iter()
                    .find(|(id, _)| *id == category.id())
                    .map(|(_, count)| *count as f64)
                    .unwrap_or(0.0)
            })
            .collect();

        Ok(AggregatedData {
            columns: columns_of(&data),
            x_axis: Category::ALL.iter().map(|c| c.to_string()).collect(),
            series: totals_series(values),
            data,
        })
    }
}
