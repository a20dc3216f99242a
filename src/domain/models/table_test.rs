use anyhow::Result;
use serde_json::json;

use super::cell_text;
use super::TableData;
use super::TableInfo;
use super::TableSource;

#[test]
fn it_parses_table_listings() -> Result<()> {
    let tables = serde_json::from_str::<Vec<TableInfo>>(
        r#"[{"table_id":"t1","table_name":"bs","source":"user_upload","row_count":4,"column_count":3},
            {"table_id":"t2","table_name":"model","source":"something_new"}]"#,
    )?;

    assert_eq!(tables[0].source, TableSource::UserUpload);
    assert_eq!(tables[0].source.to_string(), "user_upload");
    assert_eq!(tables[1].source, TableSource::Unknown);
    assert_eq!(tables[1].row_count, 0);

    return Ok(());
}

#[test]
fn it_renders_cells_in_column_order() -> Result<()> {
    let data = serde_json::from_str::<TableData>(
        r#"{
            "table_id": "t1",
            "table_name": "bs",
            "source": "financial_modeling",
            "columns": [
                {"id": "metric", "name": "Metric", "type": "string"},
                {"id": "value", "name": "Value", "type": "number"},
                {"id": "audited", "name": "Audited", "type": "boolean"}
            ],
            "rows": [
                {"value": 12.5, "metric": "Cash", "audited": true},
                {"metric": "Debt", "value": null, "audited": false}
            ],
            "row_count": 2
        }"#,
    )?;

    assert_eq!(
        data.cell_texts(),
        vec![vec!["Cash", "12.5", "Yes"], vec!["Debt", "-", "No"]]
    );

    return Ok(());
}

#[test]
fn it_renders_missing_cells() {
    assert_eq!(cell_text(None, "string"), "-");
    assert_eq!(cell_text(Some(&json!(3)), "number"), "3");
}
