#[cfg(test)]
#[path = "playground_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Method;
use tokio::sync::mpsc;

use super::forward_run_stream;
use crate::domain::models::AgentBackend;
use crate::domain::models::AgentOption;
use crate::domain::models::AgentRecord;
use crate::domain::models::BackendName;
use crate::domain::models::Event;
use crate::domain::models::RunRequest;
use crate::domain::models::SessionEntry;
use crate::domain::models::SessionRecord;
use crate::infrastructure::api::ApiClient;

/// Standalone agent playground server. Routes are not tenant scoped and
/// sessions can be reopened and deleted.
pub struct PlaygroundBackend {
    api: ApiClient,
    timeout: String,
}

impl PlaygroundBackend {
    pub fn new(api: ApiClient, timeout: &str) -> PlaygroundBackend {
        return PlaygroundBackend {
            api,
            timeout: timeout.to_string(),
        };
    }
}

#[async_trait]
impl AgentBackend for PlaygroundBackend {
    fn name(&self) -> BackendName {
        return BackendName::Playground;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = self
            .api
            .status(
                "/v1/playground/status",
                Duration::from_millis(self.timeout.parse::<u64>()?),
            )
            .await;

        let status = match res {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(error = ?err, "playground is not running");
                bail!(format!(
                    "The agent playground is not running at {}",
                    self.api.url("")
                ));
            }
        };

        if status != 200 {
            tracing::error!(status = status.as_u16(), "playground health check failed");
            bail!("The agent playground health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_agents(&self) -> Result<Vec<AgentOption>> {
        let agents = self
            .api
            .get_json::<Vec<AgentRecord>>("/v1/playground/agents")
            .await?;

        return Ok(agents.into_iter().map(AgentOption::from).collect());
    }

    #[allow(clippy::implicit_return)]
    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionEntry>> {
        let sessions = self
            .api
            .get_json_opt::<Vec<SessionEntry>>(&format!(
                "/v1/playground/agents/{agent_id}/sessions"
            ))
            .await?;

        return Ok(sessions.unwrap_or_default());
    }

    #[allow(clippy::implicit_return)]
    async fn get_session(&self, agent_id: &str, session_id: &str) -> Result<SessionRecord> {
        return self
            .api
            .get_json::<SessionRecord>(&format!(
                "/v1/playground/agents/{agent_id}/sessions/{session_id}"
            ))
            .await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<()> {
        return self
            .api
            .delete(&format!(
                "/v1/playground/agents/{agent_id}/sessions/{session_id}"
            ))
            .await;
    }

    #[allow(clippy::implicit_return)]
    async fn run<'a>(
        &self,
        request: RunRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let form = multipart::Form::new()
            .text("message", request.message.to_string())
            .text("stream", "true")
            .text("monitor", "false")
            .text("session_id", request.session_id.to_string());

        tracing::debug!(
            run_id = request.run_id,
            agent_id = %request.agent_id,
            "starting playground run"
        );

        let res = self
            .api
            .send(
                self.api
                    .request(
                        Method::POST,
                        &format!("/v1/playground/agents/{}/runs", request.agent_id),
                    )
                    .multipart(form),
            )
            .await?;

        return forward_run_stream(res, request.run_id, tx).await;
    }
}
