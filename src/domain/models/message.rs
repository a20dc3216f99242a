#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Audio;
use super::ExtraData;
use super::Image;
use super::ResponseAudio;
use super::ToolCall;
use super::Video;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Agent,
    System,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: i64,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub streaming_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<Audio>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_audio: Option<ResponseAudio>,
}

impl Message {
    pub fn new(role: Role, content: &str, created_at: i64) -> Message {
        return Message {
            role,
            content: content.to_string(),
            created_at,
            tool_calls: vec![],
            streaming_error: false,
            extra_data: None,
            images: None,
            videos: None,
            audio: None,
            response_audio: None,
        };
    }

    pub fn user(content: &str, created_at: i64) -> Message {
        return Message::new(Role::User, content, created_at);
    }

    /// Empty agent bubble that incoming chunks are folded into.
    pub fn agent_placeholder(created_at: i64) -> Message {
        return Message::new(Role::Agent, "", created_at);
    }

    pub fn is_agent(&self) -> bool {
        return self.role == Role::Agent;
    }

    pub fn append(&mut self, text: &str) {
        self.content += text;
    }

    pub fn append_transcript(&mut self, transcript: &str) {
        let audio = self.response_audio.get_or_insert_with(ResponseAudio::default);
        let mut current = audio.transcript.take().unwrap_or_default();
        current += transcript;
        audio.transcript = Some(current);
    }

    pub fn merge_extra_data(&mut self, incoming: &ExtraData) {
        let extra_data = self.extra_data.get_or_insert_with(ExtraData::default);
        if let Some(steps) = &incoming.reasoning_steps {
            extra_data.reasoning_steps = Some(steps.clone());
        }
        if let Some(references) = &incoming.references {
            extra_data.references = Some(references.clone());
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        return self
            .tool_calls
            .iter()
            .map(|tool| return tool.tool_name.to_string())
            .collect();
    }
}
