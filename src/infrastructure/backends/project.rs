#[cfg(test)]
#[path = "project_test.rs"]
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
use crate::infrastructure::api::Scope;

/// Agents hosted inside a project workspace. Every route is scoped to the
/// configured tenant and project.
pub struct ProjectBackend {
    api: ApiClient,
    scope: Scope,
    timeout: String,
}

impl ProjectBackend {
    pub fn new(api: ApiClient, scope: Scope, timeout: &str) -> ProjectBackend {
        return ProjectBackend {
            api,
            scope,
            timeout: timeout.to_string(),
        };
    }

    fn agent_path(&self, agent_id: &str, suffix: &str) -> String {
        return self.scope.path(&format!("/agents/{agent_id}{suffix}"));
    }
}

#[async_trait]
impl AgentBackend for ProjectBackend {
    fn name(&self) -> BackendName {
        return BackendName::Project;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let path = self.scope.path("/workspace/status");
        let res = self
            .api
            .status(&path, Duration::from_millis(self.timeout.parse::<u64>()?))
            .await;

        let status = match res {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(error = ?err, url = %self.api.url(&path), "workspace is not reachable");
                bail!(format!(
                    "The agent workspace is not reachable at {}",
                    self.api.url("")
                ));
            }
        };

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "workspace health check failed");
            bail!("The agent workspace health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_agents(&self) -> Result<Vec<AgentOption>> {
        let agents = self
            .api
            .get_json::<Vec<AgentRecord>>(&self.scope.path("/agents"))
            .await?;

        return Ok(agents.into_iter().map(AgentOption::from).collect());
    }

    #[allow(clippy::implicit_return)]
    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionEntry>> {
        let sessions = self
            .api
            .get_json_opt::<Vec<SessionEntry>>(&self.agent_path(agent_id, "/sessions"))
            .await?;

        return Ok(sessions.unwrap_or_default());
    }

    #[allow(clippy::implicit_return)]
    async fn get_session(&self, _agent_id: &str, _session_id: &str) -> Result<SessionRecord> {
        bail!("Loading past sessions is not supported by the project backend");
    }

    #[allow(clippy::implicit_return)]
    async fn delete_session(&self, _agent_id: &str, _session_id: &str) -> Result<()> {
        bail!("Deleting sessions is not supported by the project backend");
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
            .text("session_id", request.session_id.to_string());

        tracing::debug!(
            run_id = request.run_id,
            agent_id = %request.agent_id,
            session_id = %request.session_id,
            "starting agent run"
        );

        let res = self
            .api
            .send(
                self.api
                    .request(Method::POST, &self.agent_path(&request.agent_id, "/run"))
                    .multipart(form),
            )
            .await?;

        return forward_run_stream(res, request.run_id, tx).await;
    }
}
