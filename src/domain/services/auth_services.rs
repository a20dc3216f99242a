#[cfg(test)]
#[path = "auth_services_test.rs"]
mod tests;

use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub token: Option<String>,
    pub is_authenticated: bool,
}

/// Access token persisted between invocations as a small JSON file.
pub struct AuthStore {
    pub file_path: PathBuf,
}

impl Default for AuthStore {
    fn default() -> AuthStore {
        return AuthStore::new(PathBuf::from(Config::get(ConfigKey::AuthFile)));
    }
}

impl AuthStore {
    pub fn new(file_path: PathBuf) -> AuthStore {
        return AuthStore { file_path };
    }

    /// Missing or unreadable files read as signed out.
    pub fn load(&self) -> AuthState {
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(_) => return AuthState::default(),
        };

        return serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = ?self.file_path, error = ?err, "ignoring unreadable auth file");
            return AuthState::default();
        });
    }

    pub fn token(&self) -> Option<String> {
        return self.load().token.filter(|e| return !e.is_empty());
    }

    pub fn require_token(&self) -> Result<String> {
        if let Some(token) = self.token() {
            return Ok(token);
        }

        bail!("You are not signed in. Run `dcfdesk login` first.");
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        return self.save(&AuthState {
            token: Some(token.to_string()),
            is_authenticated: true,
        });
    }

    pub fn clear(&self) -> Result<()> {
        return self.save(&AuthState::default());
    }

    fn save(&self, state: &AuthState) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.file_path, serde_json::to_string(state)?)?;

        return Ok(());
    }
}
