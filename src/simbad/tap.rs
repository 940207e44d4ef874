//! Parsing of TAP `format=json` responses
//!
//! The JSON layout is `{"metadata": [{"name": ...}, ...], "data": [[...], ...]}`
//! with `null` for missing values.

use serde::Deserialize;
use serde_json::Value;

use crate::outcome::AttributeValue;
use crate::Result;
use crate::StarqueryError;

#[derive(Debug, Deserialize)]
struct ColumnMeta {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    metadata: Vec<ColumnMeta>,
    data: Vec<Vec<Value>>,
}

/// A result table from a TAP service
#[derive(Debug, Clone, PartialEq)]
pub struct TapTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<AttributeValue>>>,
}

impl TapTable {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawTable = serde_json::from_str(text)?;
        let columns: Vec<String> = raw.metadata.into_iter().map(|c| c.name).collect();

        let mut rows = Vec::with_capacity(raw.data.len());
        for (i, row) in raw.data.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(StarqueryError::ResponseError(format!(
                    "row {} has {} values for {} columns",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row.into_iter().map(json_to_value).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of the first column, rendered as text
    pub fn first_column_text(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first().cloned().flatten())
            .map(|v| v.to_string())
            .collect()
    }

    /// Render a row as tab-separated text, `None` for missing values
    pub fn render_row(row: &[Option<AttributeValue>]) -> String {
        row.iter()
            .map(|v| match v {
                Some(v) => v.to_string(),
                None => "None".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }
}

fn json_to_value(value: Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(AttributeValue::Number),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(AttributeValue::Text(trimmed.to_string()))
            }
        }
        Value::Bool(b) => Some(AttributeValue::Text(b.to_string())),
        other => Some(AttributeValue::Text(other.to_string())),
    }
}
