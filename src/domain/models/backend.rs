#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use super::Event;
use super::SessionEntry;
use super::SessionRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Project,
    Playground,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

/// Agent as returned by the agents listing endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRecord {
    pub agent_id: Option<String>,
    pub name: Option<String>,
    pub model: Option<Value>,
    pub storage: Option<bool>,
}

/// Agent shaped for selection prompts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOption {
    pub value: String,
    pub label: String,
    pub model: String,
    pub storage: bool,
}

impl From<AgentRecord> for AgentOption {
    fn from(record: AgentRecord) -> AgentOption {
        let model = match record.model {
            Some(Value::String(model)) => model,
            Some(Value::Object(map)) => map
                .get("model")
                .or_else(|| return map.get("name"))
                .and_then(|e| return e.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => "".to_string(),
        };

        return AgentOption {
            value: record.agent_id.unwrap_or_default(),
            label: record.name.unwrap_or_default(),
            model,
            storage: record.storage.unwrap_or(false),
        };
    }
}

/// Outbound request for a single agent invocation. `run_id` is local and
/// tags every event produced by the run so stale events can be discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub run_id: u64,
    pub agent_id: String,
    pub message: String,
    pub session_id: String,
}

#[async_trait]
pub trait AgentBackend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify the agent host is reachable before the
    /// playground opens.
    async fn health_check(&self) -> Result<()>;

    /// Lists agents available to the current workspace.
    async fn list_agents(&self) -> Result<Vec<AgentOption>>;

    /// Lists past sessions for an agent. Agents without storage have none.
    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionEntry>>;

    /// Loads a full session so its transcript can be restored.
    async fn get_session(&self, agent_id: &str, session_id: &str) -> Result<SessionRecord>;

    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<()>;

    /// Starts an agent run and forwards every decoded chunk through the
    /// channel as `Event::RunChunk`, in arrival order. Returns once the
    /// response body is exhausted. Transport failures are returned as errors
    /// and left to the caller to report.
    async fn run<'a>(&self, request: RunRequest, tx: &'a mpsc::UnboundedSender<Event>)
        -> Result<()>;
}

pub type BackendBox = Box<dyn AgentBackend + Send + Sync>;
