use anyhow::Result;
use reqwest::Method;
use serde_json::Value;

use super::ApiClient;
use crate::domain::models::Registration;
use crate::domain::models::TokenResponse;

impl ApiClient {
    /// Exchanges credentials for an access token and stores it.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let res = self
            .send(
                self.request(Method::POST, "/api/v1/auth/login")
                    .form(&[("username", username), ("password", password)]),
            )
            .await?;

        let token = res.json::<TokenResponse>().await?;
        self.auth().set_token(&token.access_token)?;
        tracing::debug!(username, "signed in");

        return Ok(());
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value> {
        return self
            .post_json("/api/v1/users/register", registration)
            .await;
    }

    pub fn logout(&self) -> Result<()> {
        return self.auth().clear();
    }
}
