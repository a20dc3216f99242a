#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::json;
use serde_json::Value;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
}

impl StatementKind {
    pub fn parse(text: &str) -> Option<StatementKind> {
        return StatementKind::iter().find(|e| return e.to_string() == text);
    }

    /// Name of the row field in upsert requests.
    pub fn row_field(&self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => return "line_item_name",
            StatementKind::BalanceSheet => return "metric_name",
        }
    }

    /// Rows every grid starts with, in display order.
    pub fn predefined_rows(&self) -> &'static [&'static str] {
        match self {
            StatementKind::IncomeStatement => {
                return &[
                    "Total Revenue",
                    "Cost of Sales",
                    "Total Operating Expenses",
                    "Tax Depreciation Expenses",
                    "Less: Capital Expenditures",
                ];
            }
            StatementKind::BalanceSheet => {
                return &[
                    "Current Assets",
                    "Total Assets",
                    "Current Liabilities",
                    "Total Liabilities",
                    "Total Shareholders' Equity",
                ];
            }
        }
    }
}

/// Stored statement cell. Income statements name rows `line_item_name`,
/// balance sheets `metric_name`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    #[serde(alias = "line_item_name", alias = "metric_name")]
    pub row: String,
    pub date_period: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementData {
    pub project_id: String,
    pub data: Vec<StatementEntry>,
}

/// Row name to period to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementGrid {
    cells: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

impl StatementGrid {
    pub fn from_entries(entries: &[StatementEntry]) -> StatementGrid {
        let mut grid = StatementGrid::default();
        for entry in entries {
            grid.set(&entry.row, &entry.date_period, entry.value);
        }

        return grid;
    }

    pub fn is_empty(&self) -> bool {
        return self.cells.is_empty();
    }

    pub fn get(&self, row: &str, period: &str) -> Option<f64> {
        return self
            .cells
            .get(row)
            .and_then(|periods| return periods.get(period).copied().flatten());
    }

    pub fn set(&mut self, row: &str, period: &str, value: Option<f64>) {
        self.cells
            .entry(row.to_string())
            .or_default()
            .insert(period.to_string(), value);
    }

    /// Sorted union of all periods across rows.
    pub fn periods(&self) -> Vec<String> {
        let mut periods = self
            .cells
            .values()
            .flat_map(|periods| return periods.keys().cloned())
            .collect::<Vec<String>>();
        periods.sort();
        periods.dedup();

        return periods;
    }

    /// Predefined rows first, then any extra rows the server returned.
    pub fn rows(&self, kind: StatementKind) -> Vec<String> {
        let predefined = kind.predefined_rows();
        let mut rows = predefined
            .iter()
            .map(|row| return row.to_string())
            .collect::<Vec<String>>();
        for row in self.cells.keys() {
            if !predefined.contains(&row.as_str()) {
                rows.push(row.to_string());
            }
        }

        return rows;
    }

    pub fn to_entries(&self) -> Vec<StatementEntry> {
        let mut entries = vec![];
        for (row, periods) in self.cells.iter() {
            for (period, value) in periods.iter() {
                entries.push(StatementEntry {
                    row: row.to_string(),
                    date_period: period.to_string(),
                    value: *value,
                });
            }
        }

        return entries;
    }

    pub fn to_upsert_body(&self, kind: StatementKind) -> Value {
        let data = self
            .to_entries()
            .iter()
            .map(|entry| {
                let mut item = serde_json::Map::new();
                item.insert(kind.row_field().to_string(), json!(entry.row));
                item.insert("date_period".to_string(), json!(entry.date_period));
                item.insert("value".to_string(), json!(entry.value));
                return Value::Object(item);
            })
            .collect::<Vec<Value>>();

        return json!({ "data": data });
    }
}
