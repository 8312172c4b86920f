use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ParseError;

/// One raw record as handed over by a data source: column name to value.
pub type Row = Map<String, Value>;

/// Closed set of task categories, in their declared display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Office,
    Programming,
    Leisure,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Office, Category::Programming, Category::Leisure];

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Category::Office),
            2 => Some(Category::Programming),
            3 => Some(Category::Leisure),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Category::Office => 1,
            Category::Programming => 2,
            Category::Leisure => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Office => "Office",
            Category::Programming => "Programming",
            Category::Leisure => "Leisure",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id_category: i64,
    pub name: String,
    pub description: String,
    pub owner: String,
}

impl Task {
    pub const COLUMNS: [&'static str; 4] = ["id_category", "name", "description", "owner"];

    pub fn new(
        id_category: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id_category,
            name: name.into(),
            description: description.into(),
            owner: owner.into(),
        }
    }

    /// `None` when the id is outside the enumerated set.
    pub fn category(&self) -> Option<Category> {
        Category::from_id(self.id_category)
    }

    pub fn from_row(row: &Row) -> Result<Self, ParseError> {
        Ok(Self {
            id_category: integer_field(row, "id_category")?,
            name: text_field(row, "name")?,
            description: text_field(row, "description")?,
            owner: text_field(row, "owner")?,
        })
    }

    /// Parses every row, failing on the first malformed one with its position.
    pub fn from_rows(rows: &[Row]) -> Result<Vec<Self>, ParseError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                Self::from_row(row).map_err(|source| ParseError::AtRow {
                    index,
                    source: Box::new(source),
                })
            })
            .collect()
    }

    /// Cell text for a column of [`Task::COLUMNS`].
    pub fn cell(&self, column: &str) -> String {
        match column {
            "id_category" => self.id_category.to_string(),
            "name" => self.name.clone(),
            "description" => self.description.clone(),
            "owner" => self.owner.clone(),
            _ => String::new(),
        }
    }
}

impl TryFrom<&Row> for Task {
    type Error = ParseError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Task::from_row(row)
    }
}

fn field<'a>(row: &'a Row, name: &'static str) -> Result<&'a Value, ParseError> {
    row.get(name).ok_or(ParseError::MissingField(name))
}

fn text_field(row: &Row, name: &'static str) -> Result<String, ParseError> {
    match field(row, name)? {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(ParseError::InvalidField {
            field: name,
            expected: "text",
            found: other.to_string(),
        }),
    }
}

fn integer_field(row: &Row, name: &'static str) -> Result<i64, ParseError> {
    let value = field(row, name)?;
    value.as_i64().ok_or_else(|| ParseError::InvalidField {
        field: name,
        expected: "integer",
        found: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_complete_row() {
        let r = row(json!({"id_category": 2, "name": "Code", "description": "d2", "owner": "bob"}));
        let task = Task::try_from(&r).unwrap();
        assert_eq!(task, Task::new(2, "Code", "d2", "bob"));
        assert_eq!(task.category(), Some(Category::Programming));
    }

    #[test]
    fn missing_field_is_named() {
        let r = row(json!({"id_category": 1, "name": "Report", "description": "d"}));
        let err = Task::from_row(&r).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("owner")));
    }

    #[test]
    fn mistyped_category_is_rejected() {
        let r = row(json!({"id_category": "one", "name": "a", "description": "b", "owner": "c"}));
        let err = Task::from_row(&r).unwrap_err();
        assert!(err.to_string().contains("id_category"));
    }

    #[test]
    fn batch_parse_reports_row_index() {
        let rows = vec![
            row(json!({"id_category": 1, "name": "a", "description": "b", "owner": "c"})),
            row(json!({"id_category": 1, "name": "a"})),
        ];
        match Task::from_rows(&rows) {
            Err(ParseError::AtRow { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_category_id_has_no_category() {
        assert_eq!(Task::new(9, "x", "y", "z").category(), None);
    }

    #[test]
    fn display_name_lookup_ignores_case() {
        assert_eq!(Category::from_display_name("programming"), Some(Category::Programming));
        assert_eq!(Category::from_display_name("LEISURE"), Some(Category::Leisure));
        assert_eq!(Category::from_display_name("Gardening"), None);
    }
}
