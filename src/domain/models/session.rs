#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ExtraData;
use super::Image;
use super::Message;
use super::ResponseAudio;
use super::Role;
use super::RunContent;
use super::ToolCall;
use super::Video;

/// A persisted conversation thread for one agent, as listed in the sidebar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunInput {
    pub role: Option<Role>,
    pub content: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOutput {
    pub content: Option<RunContent>,
    pub created_at: Option<i64>,
    pub tools: Option<Vec<ToolCall>>,
    pub extra_data: Option<ExtraData>,
    pub images: Option<Vec<Image>>,
    pub videos: Option<Vec<Video>>,
    pub response_audio: Option<ResponseAudio>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRecord {
    pub message: Option<RunInput>,
    pub response: Option<RunOutput>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMemory {
    pub runs: Vec<RunRecord>,
}

/// Full session payload returned when reopening a past conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub session_id: String,
    pub agent_id: Option<String>,
    pub memory: Option<SessionMemory>,
}

impl SessionRecord {
    /// Rebuilds the chat transcript from stored runs, one user and one agent
    /// message per run.
    pub fn to_messages(&self) -> Vec<Message> {
        let runs = match &self.memory {
            Some(memory) => &memory.runs,
            None => return vec![],
        };

        let mut messages = vec![];
        for run in runs {
            if let Some(input) = &run.message {
                if let Some(content) = &input.content {
                    messages.push(Message::user(content, input.created_at.unwrap_or_default()));
                }
            }

            if let Some(output) = &run.response {
                let created_at = output.created_at.unwrap_or_default();
                let content = output
                    .content
                    .as_ref()
                    .map(|content| return content.to_final_text())
                    .unwrap_or_default();

                let mut message = Message::new(Role::Agent, &content, created_at);
                message.tool_calls = output.tools.clone().unwrap_or_default();
                message.extra_data = output.extra_data.clone();
                message.images = output.images.clone();
                message.videos = output.videos.clone();
                message.response_audio = output.response_audio.clone();
                messages.push(message);
            }
        }

        return messages;
    }
}
