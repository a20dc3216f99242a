#[cfg(test)]
#[path = "dcf_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatType {
    Currency,
    Percentage,
    Number,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfPeriod {
    pub label: String,
    pub date_end: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfLineItem {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub format_type: FormatType,
}

impl DcfLineItem {
    /// Totals and valuation rows are highlighted in the results table.
    pub fn is_key_row(&self) -> bool {
        return [
            "Total Revenue",
            "Free Cash Flow",
            "Terminal Value",
            "Total Equity Value",
        ]
        .iter()
        .any(|key| return self.name.contains(key));
    }

    pub fn formatted_values(&self) -> Vec<String> {
        return self
            .values
            .iter()
            .map(|value| return format_value(*value, &self.format_type))
            .collect();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfModel {
    pub project_id: String,
    pub periods: Vec<DcfPeriod>,
    pub line_items: Vec<DcfLineItem>,
}

/// Groups the integer part of a formatted number with commas.
fn group_thousands(formatted: &str) -> String {
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted, None),
    };

    let digits = int_part.chars().collect::<Vec<char>>();
    let mut grouped = String::new();
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }

    return grouped;
}

fn with_sign(value: f64, body: String, prefix: &str, suffix: &str) -> String {
    let sign = if value < 0.0 && body.chars().any(|c| return c != '0' && c != '.' && c != ',') {
        "-"
    } else {
        ""
    };

    return format!("{sign}{prefix}{body}{suffix}");
}

/// Formats a results cell: currency without cents, percentages from
/// fractions with one decimal, plain numbers with four decimals.
pub fn format_value(value: Option<f64>, format_type: &FormatType) -> String {
    let value = match value {
        Some(value) if value.is_finite() => value,
        Some(value) => return value.to_string(),
        None => return "-".to_string(),
    };

    match format_type {
        FormatType::Currency => {
            let body = group_thousands(&format!("{:.0}", value.abs()));
            return with_sign(value, body, "$", "");
        }
        FormatType::Percentage => {
            let body = group_thousands(&format!("{:.1}", (value * 100.0).abs()));
            return with_sign(value, body, "", "%");
        }
        FormatType::Number => {
            let body = group_thousands(&format!("{:.4}", value.abs()));
            return with_sign(value, body, "", "");
        }
        FormatType::Other => return value.to_string(),
    }
}
