use anyhow::Result;

use super::ApiClient;
use super::Scope;
use crate::domain::models::StatementData;
use crate::domain::models::StatementGrid;
use crate::domain::models::StatementKind;

fn statement_path(scope: &Scope, kind: StatementKind) -> String {
    return scope.path(&format!("/financial-statements/{kind}"));
}

impl ApiClient {
    pub async fn get_statement(
        &self,
        scope: &Scope,
        kind: StatementKind,
    ) -> Result<Option<StatementData>> {
        return self.get_json_opt(&statement_path(scope, kind)).await;
    }

    pub async fn save_statement(
        &self,
        scope: &Scope,
        kind: StatementKind,
        grid: &StatementGrid,
    ) -> Result<StatementData> {
        return self
            .put_json(&statement_path(scope, kind), &grid.to_upsert_body(kind))
            .await;
    }

    /// A statement that was never saved loads as an empty grid.
    pub async fn load_statement_grid(
        &self,
        scope: &Scope,
        kind: StatementKind,
    ) -> Result<StatementGrid> {
        match self.get_statement(scope, kind).await? {
            Some(data) => return Ok(StatementGrid::from_entries(&data.data)),
            None => return Ok(StatementGrid::default()),
        }
    }
}
