use anyhow::{Context, Result};
use serde::Deserialize;

const KNOWN_CONTEXTS: &[&str] = &[
    "all", "page", "frame", "selection", "link", "editable", "password", "image", "video", "audio",
];

/// Extension settings, bundled as `keylock.toml` and shared by all three contexts.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExtensionConfig {
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u32,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub popup: PopupConfig,
    #[serde(default)]
    pub fill: FillConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MenuConfig {
    #[serde(default = "default_menu_title")]
    pub title_template: String,
    #[serde(default = "default_contexts")]
    pub contexts: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PopupConfig {
    #[serde(default = "default_popup_label")]
    pub label_template: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FillConfig {
    /// `<input type>`s that receive the username.
    #[serde(default = "default_username_input_types")]
    pub username_input_types: Vec<String>,
}

fn default_reply_timeout_ms() -> u32 {
    10_000
}

fn default_storage_key() -> String {
    "entries".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_menu_title() -> String {
    "{name} (Username: {user})".to_string()
}

fn default_contexts() -> Vec<String> {
    vec!["editable".to_string(), "password".to_string()]
}

fn default_popup_label() -> String {
    "{name} (username: {user})".to_string()
}

fn default_username_input_types() -> Vec<String> {
    vec!["text".to_string(), "email".to_string()]
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            title_template: default_menu_title(),
            contexts: default_contexts(),
        }
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            label_template: default_popup_label(),
        }
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            username_input_types: default_username_input_types(),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: default_reply_timeout_ms(),
            storage_key: default_storage_key(),
            log_level: default_log_level(),
            menu: MenuConfig::default(),
            popup: PopupConfig::default(),
            fill: FillConfig::default(),
        }
    }
}

impl ExtensionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse extension config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reply_timeout_ms == 0 {
            anyhow::bail!("reply_timeout_ms must be greater than zero");
        }
        if self.storage_key.trim().is_empty() {
            anyhow::bail!("storage_key must not be empty");
        }
        if !self.menu.title_template.contains("{name}") {
            anyhow::bail!(
                "menu.title_template must contain {{name}}: {}",
                self.menu.title_template
            );
        }
        if self.menu.contexts.is_empty() {
            anyhow::bail!("menu.contexts must not be empty");
        }
        if let Some(unknown) = self
            .menu
            .contexts
            .iter()
            .find(|c| !KNOWN_CONTEXTS.contains(&c.as_str()))
        {
            anyhow::bail!("Unknown menu context: {}", unknown);
        }
        Ok(())
    }

    /// `log_level` as a filter, falling back to `Info` for unknown names.
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}
