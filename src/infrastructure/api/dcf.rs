use anyhow::Result;

use super::ApiClient;
use super::Scope;
use crate::domain::models::DcfModel;

impl ApiClient {
    pub async fn get_dcf_model(&self, scope: &Scope) -> Result<Option<DcfModel>> {
        return self.get_json_opt(&scope.path("/dcf-model-results")).await;
    }
}
