use anyhow::Result;
use reqwest::multipart;
use reqwest::Method;
use tokio::fs;

use super::ApiClient;
use super::Scope;
use crate::domain::models::DocumentUpload;
use crate::domain::models::Page;
use crate::domain::models::TabularDocument;

impl ApiClient {
    pub async fn list_documents(
        &self,
        scope: &Scope,
        next_token: Option<&str>,
    ) -> Result<Page<TabularDocument>> {
        let mut req = self.request(Method::GET, &scope.path("/tabular_documents"));
        if let Some(token) = next_token {
            req = req.query(&[("next_token", token)]);
        }

        let res = self.send(req).await?;
        return Ok(res.json::<Page<TabularDocument>>().await?);
    }

    /// Follows `next_token` until every page is loaded.
    pub async fn list_all_documents(&self, scope: &Scope) -> Result<Vec<TabularDocument>> {
        let mut documents = vec![];
        let mut next_token: Option<String> = None;
        loop {
            let page = self.list_documents(scope, next_token.as_deref()).await?;
            let has_more = page.has_more();
            documents.extend(page.items);
            if !has_more {
                break;
            }
            next_token = page.next_token;
        }

        return Ok(documents);
    }

    pub async fn upload_document(
        &self,
        scope: &Scope,
        upload: &DocumentUpload,
    ) -> Result<TabularDocument> {
        let bytes = fs::read(&upload.file_path).await?;
        let mut form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(upload.file_name()),
            )
            .text("name", upload.name.to_string())
            .text("type", upload.document_type.to_string())
            .text("company", upload.company.to_string());
        if let Some(annotation) = &upload.annotation {
            form = form.text("annotation", annotation.to_string());
        }

        let res = self
            .send(
                self.request(Method::POST, &scope.path("/tabular_documents"))
                    .multipart(form),
            )
            .await?;

        if res.status().as_u16() != 201 {
            tracing::warn!(status = res.status().as_u16(), "unexpected upload status");
        }

        return Ok(res.json::<TabularDocument>().await?);
    }

    pub async fn delete_document(&self, scope: &Scope, document_id: &str) -> Result<()> {
        return self
            .delete(&scope.path(&format!("/tabular_documents/{document_id}")))
            .await;
    }
}
