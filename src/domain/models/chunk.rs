#[cfg(test)]
#[path = "chunk_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

/// Event names emitted by the agent run endpoint. Anything the playground does
/// not act on lands in `Other`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    RunStarted,
    ReasoningStarted,
    RunResponse,
    RunCompleted,
    RunError,
    #[default]
    #[serde(other)]
    Other,
}

/// Chunk content is plain text for chat agents, or an arbitrary JSON document
/// for agents with structured outputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunContent {
    Text(String),
    Structured(Value),
}

impl RunContent {
    /// Compact rendering used when a completed run replaces the message body.
    pub fn to_final_text(&self) -> String {
        match self {
            RunContent::Text(text) => return text.to_string(),
            RunContent::Structured(value) => {
                return serde_json::to_string(value)
                    .unwrap_or_else(|_| return "Error parsing response".to_string());
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCall {
    pub role: Option<String>,
    pub content: Option<Value>,
    pub tool_call_id: Option<String>,
    pub tool_name: String,
    pub tool_args: Option<Value>,
    pub tool_call_error: Option<bool>,
    pub created_at: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningStep {
    pub title: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    pub reasoning: Option<String>,
    pub next_action: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub name: Option<String>,
    pub content: Option<String>,
    pub meta_data: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub query: Option<String>,
    pub references: Vec<Reference>,
    pub time: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_steps: Option<Vec<ReasoningStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<ReferenceData>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: Option<String>,
    pub url: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub id: Option<Value>,
    pub url: Option<String>,
    pub eta: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audio {
    pub id: Option<String>,
    pub url: Option<String>,
    pub base64_audio: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAudio {
    pub id: Option<String>,
    pub content: Option<String>,
    pub transcript: Option<String>,
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
}

/// One JSON object from the streamed run response. `content` is cumulative:
/// every `RunResponse` repeats what came before plus the new text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamChunk {
    pub event: RunEvent,
    pub content: Option<RunContent>,
    pub content_type: Option<String>,
    pub session_id: Option<String>,
    pub run_id: Option<String>,
    pub agent_id: Option<String>,
    pub created_at: Option<i64>,
    pub tools: Option<Vec<ToolCall>>,
    pub extra_data: Option<ExtraData>,
    pub images: Option<Vec<Image>>,
    pub videos: Option<Vec<Video>>,
    pub audio: Option<Vec<Audio>>,
    pub response_audio: Option<ResponseAudio>,
}

impl StreamChunk {
    pub fn new(event: RunEvent) -> StreamChunk {
        return StreamChunk {
            event,
            ..StreamChunk::default()
        };
    }

    pub fn with_text(event: RunEvent, text: &str) -> StreamChunk {
        return StreamChunk {
            event,
            content: Some(RunContent::Text(text.to_string())),
            ..StreamChunk::default()
        };
    }

    pub fn transcript(&self) -> Option<&str> {
        return self
            .response_audio
            .as_ref()
            .and_then(|audio| return audio.transcript.as_deref());
    }

    /// Text surfaced to the user when the chunk reports a failed run.
    pub fn error_text(&self) -> String {
        match &self.content {
            Some(content) => return content.to_final_text(),
            None => return "The agent run failed".to_string(),
        }
    }
}

/// Renders structured content as a fenced JSON block for the transcript.
pub fn json_markdown(value: &Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| return value.to_string());

    return format!("```json\n{body}\n```");
}
