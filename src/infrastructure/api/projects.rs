use anyhow::Result;
use reqwest::Method;

use super::ApiClient;
use super::Scope;
use crate::domain::models::Page;
use crate::domain::models::Project;
use crate::domain::models::ProjectCreate;

impl ApiClient {
    pub async fn create_project(&self, tenant_id: &str, project: &ProjectCreate) -> Result<Project> {
        return self
            .post_json(&format!("/api/v1/tenants/{tenant_id}/projects"), project)
            .await;
    }

    pub async fn list_projects(
        &self,
        tenant_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Project>> {
        let mut req = self
            .request(Method::GET, &format!("/api/v1/tenants/{tenant_id}/projects"))
            .query(&[("page_size", page_size.to_string())]);
        if let Some(token) = page_token {
            req = req.query(&[("page_token", token)]);
        }

        let res = self.send(req).await?;
        return Ok(res.json::<Page<Project>>().await?);
    }

    pub async fn get_project(&self, scope: &Scope) -> Result<Project> {
        return self.get_json(&scope.path("")).await;
    }
}
