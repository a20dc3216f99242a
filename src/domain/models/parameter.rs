#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use chrono::NaiveDate;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    Decimal,
    Percentage,
    Text,
    Integer,
    Date,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub project_id: String,
    pub parameter_key: String,
    #[serde(default)]
    pub parameter_value: Option<f64>,
    #[serde(default)]
    pub parameter_text: Option<String>,
    pub data_type: DataType,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Parameter {
    pub fn display_value(&self) -> String {
        if let Some(text) = &self.parameter_text {
            return text.to_string();
        }

        return match self.parameter_value {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

/// DCF assumption fields. The display form is the camelCase form key, the
/// API key is its snake_case counterpart.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum AssumptionKey {
    NormalizedTaxRate,
    NormalizedNetWorkingCapital,
    ExitRevenueMultiple,
    DiscountRate,
    TerminalValueModel,
    TerminalGrowthRate,
    TerminalGrowthRateH,
    HalfLifePeriod,
    RevenueMultiple,
    RevenueMarketComparables,
    EbitdaMultiple,
    EbitdaMarketComparables,
    ValuationDate,
}

impl AssumptionKey {
    pub fn api_key(&self) -> &'static str {
        match self {
            AssumptionKey::NormalizedTaxRate => return "normalized_tax_rate",
            AssumptionKey::NormalizedNetWorkingCapital => return "normalized_net_working_capital",
            AssumptionKey::ExitRevenueMultiple => return "exit_revenue_multiple",
            AssumptionKey::DiscountRate => return "discount_rate",
            AssumptionKey::TerminalValueModel => return "terminal_value_model",
            AssumptionKey::TerminalGrowthRate => return "terminal_growth_rate",
            AssumptionKey::TerminalGrowthRateH => return "terminal_growth_rate_h",
            AssumptionKey::HalfLifePeriod => return "half_life_period",
            AssumptionKey::RevenueMultiple => return "revenue_multiple",
            AssumptionKey::RevenueMarketComparables => return "revenue_market_comparables",
            AssumptionKey::EbitdaMultiple => return "ebitda_multiple",
            AssumptionKey::EbitdaMarketComparables => return "ebitda_market_comparables",
            AssumptionKey::ValuationDate => return "valuation_date",
        }
    }

    pub fn from_api_key(api_key: &str) -> Option<AssumptionKey> {
        return AssumptionKey::iter().find(|key| return key.api_key() == api_key);
    }

    /// Accepts either the form key or the API key.
    pub fn parse(text: &str) -> Option<AssumptionKey> {
        if let Ok(key) = AssumptionKey::from_str(text) {
            return Some(key);
        }

        return AssumptionKey::from_api_key(text);
    }

    pub fn data_type(&self) -> DataType {
        match self {
            AssumptionKey::NormalizedTaxRate
            | AssumptionKey::NormalizedNetWorkingCapital
            | AssumptionKey::DiscountRate
            | AssumptionKey::TerminalGrowthRate
            | AssumptionKey::TerminalGrowthRateH => return DataType::Percentage,
            AssumptionKey::TerminalValueModel
            | AssumptionKey::RevenueMarketComparables
            | AssumptionKey::EbitdaMarketComparables => return DataType::Text,
            AssumptionKey::ValuationDate => return DataType::Date,
            AssumptionKey::ExitRevenueMultiple
            | AssumptionKey::HalfLifePeriod
            | AssumptionKey::RevenueMultiple
            | AssumptionKey::EbitdaMultiple => return DataType::Decimal,
        }
    }

    pub fn is_textual(&self) -> bool {
        return matches!(self.data_type(), DataType::Text | DataType::Date);
    }
}

pub const TERMINAL_VALUE_MODELS: [&str; 4] = [
    "gordon-growth",
    "h-model",
    "exit-revenue-multiple",
    "ebitda-multiple",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssumptionValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for AssumptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssumptionValue::Number(number) => return write!(f, "{number}"),
            AssumptionValue::Text(text) => return write!(f, "{text}"),
        }
    }
}

fn check_range(key: AssumptionKey, value: f64) -> Result<()> {
    let (min, max, min_msg, max_msg) = match key {
        AssumptionKey::NormalizedTaxRate => (
            0.0,
            100.0,
            "Tax rate must be positive",
            "Tax rate cannot exceed 100%",
        ),
        AssumptionKey::NormalizedNetWorkingCapital => (
            -50.0,
            50.0,
            "Working capital assumption seems extreme",
            "Working capital assumption seems extreme",
        ),
        AssumptionKey::ExitRevenueMultiple => (
            0.0,
            20.0,
            "Exit revenue multiple must be positive",
            "Exit revenue multiple seems unreasonably high",
        ),
        AssumptionKey::DiscountRate => (
            0.0,
            50.0,
            "Discount rate must be positive",
            "Discount rate seems unreasonably high",
        ),
        _ => return Ok(()),
    };

    if value < min {
        bail!(min_msg);
    }
    if value > max {
        bail!(max_msg);
    }

    return Ok(());
}

fn check_date(text: &str) -> Result<()> {
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d");
    if text.len() != 10 || parsed.is_err() {
        bail!("Date must be in YYYY-MM-DD format");
    }

    let date = parsed?;
    let min = NaiveDate::from_ymd_opt(1900, 1, 1).ok_or_else(|| return anyhow!("Invalid date"))?;
    let max =
        NaiveDate::from_ymd_opt(2100, 12, 31).ok_or_else(|| return anyhow!("Invalid date"))?;
    if date < min || date > max {
        bail!("Date must be between 1900 and 2100");
    }

    return Ok(());
}

fn round_display(value: f64) -> f64 {
    return (value * 1e10).round() / 1e10;
}

/// DCF assumptions in form units: percentages are whole numbers (25 for 25%).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DcfAssumptions {
    values: BTreeMap<AssumptionKey, AssumptionValue>,
}

impl DcfAssumptions {
    pub fn defaults(today: NaiveDate) -> DcfAssumptions {
        let mut assumptions = DcfAssumptions::default();
        let numbers = [
            (AssumptionKey::NormalizedTaxRate, 25.0),
            (AssumptionKey::NormalizedNetWorkingCapital, 2.0),
            (AssumptionKey::ExitRevenueMultiple, 8.0),
            (AssumptionKey::DiscountRate, 10.0),
            (AssumptionKey::TerminalGrowthRate, 2.5),
        ];
        for (key, value) in numbers {
            assumptions
                .values
                .insert(key, AssumptionValue::Number(value));
        }

        assumptions.values.insert(
            AssumptionKey::TerminalValueModel,
            AssumptionValue::Text("gordon-growth".to_string()),
        );
        assumptions.values.insert(
            AssumptionKey::ValuationDate,
            AssumptionValue::Text(today.format("%Y-%m-%d").to_string()),
        );

        return assumptions;
    }

    pub fn get(&self, key: AssumptionKey) -> Option<&AssumptionValue> {
        return self.values.get(&key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssumptionKey, &AssumptionValue)> {
        return self.values.iter();
    }

    pub fn is_empty(&self) -> bool {
        return self.values.is_empty();
    }

    /// Parses and validates a raw form value for a key.
    pub fn set(&mut self, key: AssumptionKey, raw: &str) -> Result<()> {
        let raw = raw.trim();
        let value = if key.is_textual() {
            AssumptionValue::Text(raw.to_string())
        } else {
            let number = raw
                .parse::<f64>()
                .map_err(|_| return anyhow!("{key} expects a number, got '{raw}'"))?;
            AssumptionValue::Number(number)
        };

        DcfAssumptions::validate(key, &value)?;
        self.values.insert(key, value);

        return Ok(());
    }

    pub fn validate(key: AssumptionKey, value: &AssumptionValue) -> Result<()> {
        match (key, value) {
            (AssumptionKey::ValuationDate, AssumptionValue::Text(text)) => return check_date(text),
            (AssumptionKey::TerminalValueModel, AssumptionValue::Text(text)) => {
                if !TERMINAL_VALUE_MODELS.contains(&text.as_str()) {
                    bail!(format!(
                        "Terminal value model must be one of: {}",
                        TERMINAL_VALUE_MODELS.join(", ")
                    ));
                }
                return Ok(());
            }
            (_, AssumptionValue::Number(number)) => {
                if key.is_textual() {
                    bail!(format!("{key} expects text"));
                }
                return check_range(key, *number);
            }
            (_, AssumptionValue::Text(_)) => {
                if !key.is_textual() {
                    bail!(format!("{key} expects a number"));
                }
                return Ok(());
            }
        }
    }

    /// Converts the form into per-key API updates. Percentages are stored as
    /// fractions server-side.
    pub fn to_updates(&self) -> Vec<(AssumptionKey, ParameterUpdate)> {
        return self
            .values
            .iter()
            .map(|(key, value)| {
                let mut update = ParameterUpdate {
                    data_type: Some(key.data_type()),
                    ..ParameterUpdate::default()
                };

                match value {
                    AssumptionValue::Text(text) => update.parameter_text = Some(text.to_string()),
                    AssumptionValue::Number(number) => {
                        let mut number = *number;
                        if key.data_type() == DataType::Percentage {
                            number /= 100.0;
                        }
                        update.parameter_value = Some(number);
                    }
                }

                return (*key, update);
            })
            .collect();
    }

    /// Builds the form from stored parameters, ignoring keys the form does
    /// not know about.
    pub fn from_parameters(parameters: &[Parameter]) -> DcfAssumptions {
        let mut assumptions = DcfAssumptions::default();
        for param in parameters {
            let key = match AssumptionKey::from_api_key(&param.parameter_key) {
                Some(key) => key,
                None => continue,
            };

            let textual = matches!(param.data_type, DataType::Text | DataType::Date);
            if textual {
                if let Some(text) = &param.parameter_text {
                    assumptions
                        .values
                        .insert(key, AssumptionValue::Text(text.to_string()));
                    continue;
                }
            }

            if let Some(value) = param.parameter_value {
                let mut value = value;
                if param.data_type == DataType::Percentage {
                    value = round_display(value * 100.0);
                }
                assumptions
                    .values
                    .insert(key, AssumptionValue::Number(value));
            }
        }

        return assumptions;
    }

    /// Overlays another form on top of this one.
    pub fn merge(&mut self, other: &DcfAssumptions) {
        for (key, value) in other.values.iter() {
            self.values.insert(*key, value.clone());
        }
    }
}
