use anyhow::Result;
use serde_json::json;

use super::json_markdown;
use super::RunContent;
use super::RunEvent;
use super::StreamChunk;

#[test]
fn it_parses_run_response_with_text() -> Result<()> {
    let chunk: StreamChunk = serde_json::from_value(json!({
        "event": "RunResponse",
        "content": "Hello",
        "content_type": "str",
        "session_id": "s1",
        "created_at": 1700000000,
        "tools": [{ "tool_name": "get_parameters", "tool_args": { "key": "discount_rate" } }]
    }))?;

    assert_eq!(chunk.event, RunEvent::RunResponse);
    assert_eq!(chunk.content, Some(RunContent::Text("Hello".to_string())));
    assert_eq!(chunk.session_id, Some("s1".to_string()));
    assert_eq!(chunk.created_at, Some(1700000000));
    assert_eq!(chunk.tools.unwrap()[0].tool_name, "get_parameters");

    return Ok(());
}

#[test]
fn it_parses_structured_content() -> Result<()> {
    let chunk: StreamChunk = serde_json::from_value(json!({
        "event": "RunResponse",
        "content": { "discount_rate": 0.1 }
    }))?;

    assert_eq!(
        chunk.content,
        Some(RunContent::Structured(json!({ "discount_rate": 0.1 })))
    );

    return Ok(());
}

#[test]
fn it_maps_unknown_events_to_other() -> Result<()> {
    let chunk: StreamChunk = serde_json::from_value(json!({
        "event": "ToolCallStarted",
        "content": null
    }))?;

    assert_eq!(chunk.event, RunEvent::Other);
    assert_eq!(chunk.content, None);

    return Ok(());
}

#[test]
fn it_reads_response_audio_transcript() -> Result<()> {
    let chunk: StreamChunk = serde_json::from_value(json!({
        "event": "RunResponse",
        "response_audio": { "transcript": "hi" }
    }))?;

    assert_eq!(chunk.transcript(), Some("hi"));

    return Ok(());
}

#[test]
fn it_renders_final_text_for_structured_content() {
    let content = RunContent::Structured(json!({ "a": 1 }));
    assert_eq!(content.to_final_text(), r#"{"a":1}"#);
}

#[test]
fn it_falls_back_to_generic_error_text() {
    let chunk = StreamChunk::new(RunEvent::RunError);
    assert_eq!(chunk.error_text(), "The agent run failed");

    let chunk = StreamChunk::with_text(RunEvent::RunError, "Rate limited");
    assert_eq!(chunk.error_text(), "Rate limited");
}

#[test]
fn it_renders_json_markdown() {
    insta::assert_snapshot!(json_markdown(&json!({ "wacc": 0.1 })), @r###"
    ```json
    {
      "wacc": 0.1
    }
    ```
    "###);
}
