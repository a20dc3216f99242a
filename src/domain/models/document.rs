#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumVariantNames, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TabularDocumentType {
    BalanceSheet,
    IncomeStatement,
}

impl TabularDocumentType {
    pub fn parse(text: &str) -> Option<TabularDocumentType> {
        return TabularDocumentType::iter().find(|e| return e.to_string() == text);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularDocument {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub company: Option<String>,
    pub annotation: Option<String>,
    pub created_at: Option<String>,
}

/// Validated form for a multipart document upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_path: PathBuf,
    pub name: String,
    pub document_type: TabularDocumentType,
    pub company: String,
    pub annotation: Option<String>,
}

impl DocumentUpload {
    pub fn new(
        file_path: PathBuf,
        name: &str,
        document_type: TabularDocumentType,
        company: &str,
        annotation: Option<String>,
    ) -> Result<DocumentUpload> {
        if company.trim().is_empty() {
            bail!("Please enter a company name.");
        }

        let name = DocumentUpload::validate_name(name)?;
        if name.is_empty() {
            bail!("Please enter a document name.");
        }

        return Ok(DocumentUpload {
            file_path,
            name,
            document_type,
            company: company.to_string(),
            annotation: annotation.filter(|e| return !e.is_empty()),
        });
    }

    /// Document names are lowercased and restricted to letters, digits and
    /// spaces, shorter than 20 characters.
    pub fn validate_name(name: &str) -> Result<String> {
        let name = name.to_lowercase();
        if name.chars().count() >= 20 {
            bail!("Name must be less than 20 characters.");
        }

        let valid = name
            .chars()
            .all(|c| return c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ');
        if !valid {
            bail!("Name must contain only lowercase English letters, numbers, and spaces.");
        }

        return Ok(name);
    }

    pub fn file_name(&self) -> String {
        return self
            .file_path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_else(|| return self.name.to_string());
    }

    /// Whether the upload would replace a document that is already listed.
    pub fn conflicts_with(&self, documents: &[TabularDocument]) -> bool {
        return documents.iter().any(|doc| return doc.name == self.name);
    }
}
