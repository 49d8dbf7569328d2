// Content-script side of a fill: pick the value for the focused field and write it.

use crate::error::Result;
use crate::protocol::FillCommand;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Password,
    Other,
}

/// The page's currently focused element.
pub trait FocusedField {
    fn tag_name(&self) -> String;

    /// The `type` attribute, if the element has one.
    fn input_type(&self) -> Option<String>;

    fn set_value_attribute(&self, value: &str) -> Result<()>;

    fn set_value_property(&self, value: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillResult {
    Written { kind: FieldKind },
    /// Nothing focused, or the focused element is neither a text nor password field.
    Skipped,
}

/// Maps an element to a `FieldKind`. `username_types` are the `<input type>`s
/// that take the username.
#[derive(Clone, Debug)]
pub struct FieldClassifier {
    username_types: Vec<String>,
}

impl FieldClassifier {
    pub fn new(username_types: Vec<String>) -> Self {
        Self {
            username_types: username_types
                .into_iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, field: &impl FocusedField) -> FieldKind {
        if !field.tag_name().eq_ignore_ascii_case("input") {
            return FieldKind::Other;
        }

        // A missing or empty type attribute means a text input.
        let input_type = field
            .input_type()
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string());

        if input_type == "password" {
            FieldKind::Password
        } else if self.username_types.iter().any(|t| *t == input_type) {
            FieldKind::Text
        } else {
            FieldKind::Other
        }
    }

    /// Write the part of `command` that belongs in `field`.
    pub fn fill<F: FocusedField>(&self, field: Option<&F>, command: &FillCommand) -> FillResult {
        let Some(field) = field else {
            log::debug!("No focused element to fill");
            return FillResult::Skipped;
        };

        let kind = self.classify(field);
        let value = match (kind, command) {
            (FieldKind::Other, _) => {
                log::debug!("Focused <{}> is not a text or password field", field.tag_name());
                return FillResult::Skipped;
            }
            (_, FillCommand::Legacy(value)) => value,
            (FieldKind::Text, FillCommand::Credentials { user, .. }) => user,
            (FieldKind::Password, FillCommand::Credentials { pass, .. }) => pass,
        };

        if let Err(e) = field.set_value_attribute(value) {
            log::error!("Error setting value attribute: {}", e);
        }
        field.set_value_property(value);

        FillResult::Written { kind }
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new(vec!["text".to_string(), "email".to_string()])
    }
}
