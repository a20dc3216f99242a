#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

mod auth;
mod dcf;
mod documents;
mod parameters;
mod projects;
mod statements;
mod tables;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::AuthStore;

/// Tenant and project a request is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub tenant_id: String,
    pub project_id: String,
}

impl Scope {
    pub fn new(tenant_id: &str, project_id: &str) -> Scope {
        return Scope {
            tenant_id: tenant_id.to_string(),
            project_id: project_id.to_string(),
        };
    }

    /// Builds the scope from the `tenant` and `project` settings.
    pub fn from_config() -> Result<Scope> {
        return Ok(Scope::new(
            &Config::require(ConfigKey::Tenant)?,
            &Config::require(ConfigKey::Project)?,
        ));
    }

    pub fn path(&self, suffix: &str) -> String {
        return format!(
            "/api/v1/tenants/{}/projects/{}{suffix}",
            self.tenant_id, self.project_id
        );
    }
}

/// Pulls a human readable message out of an error body. FastAPI style
/// `detail` fields may be a string or a list of validation errors.
pub fn error_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => return Some(detail.to_string()),
        Value::Array(items) => {
            let messages = items
                .iter()
                .filter_map(|item| return item.get("msg").and_then(|msg| return msg.as_str()))
                .collect::<Vec<&str>>();
            if messages.is_empty() {
                return None;
            }
            return Some(messages.join("; "));
        }
        _ => return None,
    }
}

/// HTTP client for the platform API. Adds the stored bearer token to every
/// request and signs the user out when the API answers 401.
pub struct ApiClient {
    url: String,
    auth: AuthStore,
    client: reqwest::Client,
}

impl Default for ApiClient {
    fn default() -> ApiClient {
        return ApiClient::new(&Config::get(ConfigKey::ApiURL), AuthStore::default());
    }
}

impl ApiClient {
    pub fn new(url: &str, auth: AuthStore) -> ApiClient {
        return ApiClient {
            url: url.trim_end_matches('/').to_string(),
            auth,
            client: reqwest::Client::new(),
        };
    }

    pub fn url(&self, path: &str) -> String {
        return format!("{}{path}", self.url);
    }

    pub fn auth(&self) -> &AuthStore {
        return &self.auth;
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = self.auth.token() {
            req = req.bearer_auth(token);
        }

        return req;
    }

    /// Sends the request and turns non-2xx answers into errors.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let res = req.send().await?;
        return self.check(res).await;
    }

    async fn check(&self, res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("token rejected, clearing auth store");
            self.auth.clear()?;
            bail!("Your session has expired. Run `dcfdesk login` to sign in again.");
        }

        let url = res.url().to_string();
        let body = res.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), url = %url, body = %body, "API request failed");

        if let Some(detail) = error_detail(&body) {
            bail!(detail);
        }
        bail!(format!("Request failed with status {}", status.as_u16()));
    }

    /// Sends the request and maps 404 to `None`.
    pub async fn send_opt(&self, req: RequestBuilder) -> Result<Option<Response>> {
        let res = req.send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        return Ok(Some(self.check(res).await?));
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.send(self.request(Method::GET, path)).await?;
        return Ok(res.json::<T>().await?);
    }

    pub async fn get_json_opt<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.send_opt(self.request(Method::GET, path)).await? {
            Some(res) => return Ok(Some(res.json::<T>().await?)),
            None => return Ok(None),
        }
    }

    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let res = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        return Ok(res.json::<T>().await?);
    }

    pub async fn put_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let res = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        return Ok(res.json::<T>().await?);
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        return Ok(());
    }

    /// Returns the status of a plain GET, with a timeout. Used for health
    /// checks where any answer is informative.
    pub async fn status(&self, path: &str, timeout: Duration) -> Result<StatusCode> {
        let res = self
            .request(Method::GET, path)
            .timeout(timeout)
            .send()
            .await?;
        return Ok(res.status());
    }
}
