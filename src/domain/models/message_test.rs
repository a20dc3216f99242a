use anyhow::Result;
use serde_json::json;

use super::Message;
use super::Role;
use crate::domain::models::ExtraData;
use crate::domain::models::ReasoningStep;
use crate::domain::models::ReferenceData;

#[test]
fn it_executes_new_keeping_content_verbatim() {
    let msg = Message::new(Role::Agent, "\t\tHi there!", 10);
    assert_eq!(msg.role, Role::Agent);
    assert_eq!(msg.content, "\t\tHi there!".to_string());
    assert_eq!(msg.created_at, 10);
    assert!(!msg.streaming_error);
    assert!(msg.tool_calls.is_empty());
}

#[test]
fn it_creates_an_empty_agent_placeholder() {
    let msg = Message::agent_placeholder(11);
    assert!(msg.is_agent());
    assert!(msg.content.is_empty());
    assert_eq!(msg.created_at, 11);
}

#[test]
fn it_executes_append() {
    let mut msg = Message::user("Hi there!", 1);
    msg.append(" It's me!\tAgain");
    assert_eq!(msg.content, "Hi there! It's me!\tAgain");
}

#[test]
fn it_concatenates_transcripts() {
    let mut msg = Message::agent_placeholder(1);
    msg.append_transcript("Hello");
    msg.append_transcript(" there");

    assert_eq!(
        msg.response_audio.unwrap().transcript,
        Some("Hello there".to_string())
    );
}

#[test]
fn it_merges_extra_data_per_field() {
    let mut msg = Message::agent_placeholder(1);
    msg.merge_extra_data(&ExtraData {
        reasoning_steps: Some(vec![ReasoningStep {
            title: Some("Load parameters".to_string()),
            ..ReasoningStep::default()
        }]),
        references: None,
    });
    msg.merge_extra_data(&ExtraData {
        reasoning_steps: None,
        references: Some(vec![ReferenceData {
            query: Some("wacc".to_string()),
            ..ReferenceData::default()
        }]),
    });

    let extra_data = msg.extra_data.unwrap();
    assert_eq!(extra_data.reasoning_steps.unwrap().len(), 1);
    assert_eq!(extra_data.references.unwrap().len(), 1);
}

#[test]
fn it_deserializes_assistant_role_as_agent() -> Result<()> {
    let msg: Message = serde_json::from_value(json!({
        "role": "assistant",
        "content": "Done.",
        "created_at": 3
    }))?;

    assert_eq!(msg.role, Role::Agent);
    assert!(!msg.streaming_error);

    return Ok(());
}
