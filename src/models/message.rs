//! Normalised inbound messages.
//!
//! Platform payloads are decoded once at the webhook boundary into
//! [`InboundMessage`]. Structured replies become a [`Selection`] so no
//! handler ever re-parses an id prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::string::normalize;

pub const FOOD_ID_PREFIX: &str = "food_";
pub const CATEGORY_ID_PREFIX: &str = "cat_";

/// A structured interaction picked from a list or button message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selection {
    Food(Uuid),
    Category(Uuid),
    /// A catalog-shaped id that no longer decodes.
    Stale(String),
    /// A quick-reply button, identified by its lowercased label.
    Reply(String),
}

impl Selection {
    /// Decodes a list-row id such as `food_<uuid>` or `cat_<uuid>`.
    pub fn from_row_id(id: &str) -> Self {
        if let Some(raw) = id.strip_prefix(FOOD_ID_PREFIX) {
            return Uuid::parse_str(raw)
                .map(Selection::Food)
                .unwrap_or_else(|_| Selection::Stale(id.to_string()));
        }
        if let Some(raw) = id.strip_prefix(CATEGORY_ID_PREFIX) {
            return Uuid::parse_str(raw)
                .map(Selection::Category)
                .unwrap_or_else(|_| Selection::Stale(id.to_string()));
        }
        Selection::Reply(normalize(id))
    }

    /// A quick-reply button press, matched by label.
    pub fn from_button_title(title: &str) -> Self {
        Selection::Reply(normalize(title))
    }

    pub fn food_row_id(id: Uuid) -> String {
        format!("{FOOD_ID_PREFIX}{id}")
    }

    pub fn category_row_id(id: Uuid) -> String {
        format!("{CATEGORY_ID_PREFIX}{id}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundContent {
    Text(String),
    Selection(Selection),
}

/// One customer message, platform-independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Stable customer identifier (phone number).
    pub sender: String,
    pub display_name: Option<String>,
    pub content: InboundContent,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            display_name: None,
            content: InboundContent::Text(body.into().trim().to_string()),
            received_at: Utc::now(),
        }
    }

    pub fn selection(sender: impl Into<String>, selection: Selection) -> Self {
        Self {
            sender: sender.into(),
            display_name: None,
            content: InboundContent::Selection(selection),
            received_at: Utc::now(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.content, InboundContent::Selection(_))
    }

    /// The text as typed (trimmed), or the label of a pressed button.
    pub fn raw_text(&self) -> &str {
        match &self.content {
            InboundContent::Text(text) => text,
            InboundContent::Selection(Selection::Reply(label)) => label,
            InboundContent::Selection(Selection::Stale(id)) => id,
            InboundContent::Selection(_) => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_decoding() {
        let id = Uuid::now_v7();
        assert_eq!(
            Selection::from_row_id(&Selection::food_row_id(id)),
            Selection::Food(id)
        );
        assert_eq!(
            Selection::from_row_id(&Selection::category_row_id(id)),
            Selection::Category(id)
        );
        assert_eq!(
            Selection::from_row_id("food_64f1c0ffee"),
            Selection::Stale("food_64f1c0ffee".to_string())
        );
        assert_eq!(
            Selection::from_row_id("Something Else"),
            Selection::Reply("something else".to_string())
        );
    }

    #[test]
    fn test_button_title_is_normalised() {
        assert_eq!(
            Selection::from_button_title("  Browse Menu "),
            Selection::Reply("browse menu".to_string())
        );
    }

    #[test]
    fn test_text_is_trimmed() {
        let message = InboundMessage::text("234", "  12 Allen Avenue, Ikeja  ");
        assert_eq!(message.raw_text(), "12 Allen Avenue, Ikeja");
        assert!(!message.is_structured());
    }
}
