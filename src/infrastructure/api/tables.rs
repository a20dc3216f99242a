use anyhow::Result;

use super::ApiClient;
use super::Scope;
use crate::domain::models::TableData;
use crate::domain::models::TableInfo;

impl ApiClient {
    pub async fn list_tables(&self, scope: &Scope) -> Result<Vec<TableInfo>> {
        return self.get_json(&scope.path("/tables")).await;
    }

    pub async fn get_table_data(&self, scope: &Scope, table_id: &str) -> Result<TableData> {
        return self
            .get_json(&scope.path(&format!("/tables/{table_id}/data")))
            .await;
    }
}
