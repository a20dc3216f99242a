#[cfg(test)]
#[path = "table_test.rs"]
mod tests;

use std::collections::HashMap;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TableSource {
    UserUpload,
    FinancialModeling,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableInfo {
    pub table_id: String,
    pub table_name: String,
    pub source: TableSource,
    pub row_count: u64,
    pub column_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableColumn {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    pub table_id: String,
    pub table_name: String,
    pub source: TableSource,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<HashMap<String, Value>>,
    pub row_count: u64,
}

impl TableData {
    /// Row-major cell text in column order.
    pub fn cell_texts(&self) -> Vec<Vec<String>> {
        return self
            .rows
            .iter()
            .map(|row| {
                return self
                    .columns
                    .iter()
                    .map(|column| return cell_text(row.get(&column.id), &column.column_type))
                    .collect();
            })
            .collect();
    }
}

pub fn cell_text(value: Option<&Value>, column_type: &str) -> String {
    let value = match value {
        Some(Value::Null) | None => return "-".to_string(),
        Some(value) => value,
    };

    match (column_type, value) {
        ("boolean", Value::Bool(flag)) => {
            if *flag {
                return "Yes".to_string();
            }
            return "No".to_string();
        }
        (_, Value::String(text)) => return text.to_string(),
        _ => return value.to_string(),
    }
}
