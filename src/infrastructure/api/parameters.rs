use anyhow::Result;

use super::ApiClient;
use super::Scope;
use crate::domain::models::DcfAssumptions;
use crate::domain::models::Parameter;
use crate::domain::models::ParameterUpdate;

impl ApiClient {
    pub async fn list_parameters(&self, scope: &Scope) -> Result<Vec<Parameter>> {
        return self.get_json(&scope.path("/parameters")).await;
    }

    pub async fn get_parameter(&self, scope: &Scope, key: &str) -> Result<Option<Parameter>> {
        return self
            .get_json_opt(&scope.path(&format!("/parameters/{key}")))
            .await;
    }

    pub async fn save_parameter(
        &self,
        scope: &Scope,
        key: &str,
        update: &ParameterUpdate,
    ) -> Result<Parameter> {
        return self
            .put_json(&scope.path(&format!("/parameters/{key}")), update)
            .await;
    }

    pub async fn delete_parameter(&self, scope: &Scope, key: &str) -> Result<()> {
        return self.delete(&scope.path(&format!("/parameters/{key}"))).await;
    }

    /// Saves every assumption one key at a time, stopping at the first
    /// failure.
    pub async fn save_assumptions(
        &self,
        scope: &Scope,
        assumptions: &DcfAssumptions,
    ) -> Result<Vec<Parameter>> {
        let mut saved = vec![];
        for (key, update) in assumptions.to_updates() {
            let res = self.save_parameter(scope, key.api_key(), &update).await;
            match res {
                Ok(parameter) => saved.push(parameter),
                Err(err) => {
                    tracing::error!(key = key.api_key(), error = ?err, "failed to save parameter");
                    return Err(err);
                }
            }
        }

        return Ok(saved);
    }

    pub async fn load_assumptions(&self, scope: &Scope) -> Result<DcfAssumptions> {
        let parameters = self.list_parameters(scope).await?;
        return Ok(DcfAssumptions::from_parameters(&parameters));
    }
}
