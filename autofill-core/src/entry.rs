// Vault entries as the bridge serializes them, and the remembered projection kept
// in the preference store.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A credential as returned by the vault bridge. `pass` is only present in
/// decrypt results.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultEntry {
    pub name: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl VaultEntry {
    pub fn new(name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            pass: None,
        }
    }

    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    pub fn remembered(&self) -> RememberedEntry {
        RememberedEntry {
            name: self.name.clone(),
            user: self.user.clone(),
        }
    }
}

/// An entry the user opted to always offer in the context menu.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RememberedEntry {
    pub name: String,
    pub user: String,
}

/// Parse the JSON array the bridge returns for list/filter/decrypt.
pub fn parse_entries(json: &str) -> Result<Vec<VaultEntry>> {
    Ok(serde_json::from_str(json)?)
}

/// Fill `{name}` and `{user}` placeholders.
pub fn render_label(template: &str, name: &str, user: &str) -> String {
    template.replace("{name}", name).replace("{user}", user)
}
