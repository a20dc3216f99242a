use anyhow::Result;

use super::format_value;
use super::DcfLineItem;
use super::DcfModel;
use super::FormatType;

#[test]
fn it_formats_currency() {
    assert_eq!(format_value(Some(1234.4), &FormatType::Currency), "$1,234");
    assert_eq!(format_value(Some(-1234.6), &FormatType::Currency), "-$1,235");
    assert_eq!(
        format_value(Some(1234567.0), &FormatType::Currency),
        "$1,234,567"
    );
    assert_eq!(format_value(Some(-0.2), &FormatType::Currency), "$0");
}

#[test]
fn it_formats_percentages() {
    assert_eq!(format_value(Some(0.123), &FormatType::Percentage), "12.3%");
    assert_eq!(format_value(Some(-0.05), &FormatType::Percentage), "-5.0%");
    assert_eq!(format_value(Some(12.5), &FormatType::Percentage), "1,250.0%");
}

#[test]
fn it_formats_numbers() {
    assert_eq!(format_value(Some(0.9091), &FormatType::Number), "0.9091");
    assert_eq!(format_value(Some(1500.5), &FormatType::Number), "1,500.5000");
}

#[test]
fn it_formats_missing_values() {
    assert_eq!(format_value(None, &FormatType::Currency), "-");
    assert_eq!(format_value(Some(2.5), &FormatType::Other), "2.5");
}

#[test]
fn it_parses_results() -> Result<()> {
    let model = serde_json::from_str::<DcfModel>(
        r#"{
            "project_id": "p1",
            "periods": [{"label": "FY24", "date_end": "2024-12-31"}],
            "line_items": [
                {"name": "Free Cash Flow", "values": [1000.0, null], "format_type": "CURRENCY"},
                {"name": "Discount Factor", "values": [0.9], "format_type": "RATIO"}
            ]
        }"#,
    )?;

    assert_eq!(model.periods[0].label, "FY24");
    assert!(model.line_items[0].is_key_row());
    assert!(!model.line_items[1].is_key_row());
    assert_eq!(model.line_items[1].format_type, FormatType::Other);
    assert_eq!(
        model.line_items[0].formatted_values(),
        vec!["$1,000", "-"]
    );

    return Ok(());
}

#[test]
fn it_flags_key_rows_by_substring() {
    let item = DcfLineItem {
        name: "Total Equity Value (USD)".to_string(),
        ..DcfLineItem::default()
    };
    assert!(item.is_key_row());
}
