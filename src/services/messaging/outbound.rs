//! Outbound message contracts.
//!
//! Builders enforce platform-independent budgets so no caller can produce a
//! label or row that a messaging platform would reject. Anything over budget
//! is cut with a trailing ellipsis and never exceeds the budget.

use serde::Serialize;

use crate::utils::string::truncate_with_ellipsis;

pub const TEXT_BODY_BUDGET: usize = 4096;
pub const INTERACTIVE_BODY_BUDGET: usize = 1024;
pub const MAX_BUTTONS: usize = 3;
pub const BUTTON_LABEL_BUDGET: usize = 20;
pub const LIST_BUTTON_BUDGET: usize = 20;
pub const SECTION_TITLE_BUDGET: usize = 24;
pub const ROW_TITLE_BUDGET: usize = 24;
pub const ROW_DESCRIPTION_BUDGET: usize = 72;
pub const MAX_LIST_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

impl ListRow {
    pub fn new(id: impl Into<String>, title: &str, description: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: truncate_with_ellipsis(title, ROW_TITLE_BUDGET),
            description: description
                .filter(|d| !d.is_empty())
                .map(|d| truncate_with_ellipsis(d, ROW_DESCRIPTION_BUDGET)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

impl ListSection {
    pub fn new(title: &str, rows: Vec<ListRow>) -> Self {
        Self {
            title: truncate_with_ellipsis(title, SECTION_TITLE_BUDGET),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        body: String,
    },
    Buttons {
        body: String,
        buttons: Vec<String>,
    },
    List {
        header: Option<String>,
        body: String,
        button_label: String,
        sections: Vec<ListSection>,
    },
}

impl OutboundMessage {
    pub fn text(body: impl AsRef<str>) -> Self {
        Self::Text {
            body: truncate_with_ellipsis(body.as_ref(), TEXT_BODY_BUDGET),
        }
    }

    /// Quick-reply buttons. Extra buttons beyond the cap are dropped.
    pub fn buttons<S: AsRef<str>>(body: impl AsRef<str>, labels: &[S]) -> Self {
        Self::Buttons {
            body: truncate_with_ellipsis(body.as_ref(), INTERACTIVE_BODY_BUDGET),
            buttons: labels
                .iter()
                .take(MAX_BUTTONS)
                .map(|label| truncate_with_ellipsis(label.as_ref(), BUTTON_LABEL_BUDGET))
                .collect(),
        }
    }

    /// A titled, sectioned list. Rows beyond the platform cap are dropped
    /// from the last sections first; emptied sections are removed.
    pub fn list(
        header: Option<&str>,
        body: impl AsRef<str>,
        button_label: &str,
        sections: Vec<ListSection>,
    ) -> Self {
        let mut remaining = MAX_LIST_ROWS;
        let sections = sections
            .into_iter()
            .filter_map(|mut section| {
                section.rows.truncate(remaining);
                remaining -= section.rows.len();
                (!section.rows.is_empty()).then_some(section)
            })
            .collect();

        Self::List {
            header: header.map(|h| truncate_with_ellipsis(h, SECTION_TITLE_BUDGET * 2)),
            body: truncate_with_ellipsis(body.as_ref(), INTERACTIVE_BODY_BUDGET),
            button_label: truncate_with_ellipsis(button_label, LIST_BUTTON_BUDGET),
            sections,
        }
    }

    /// The main body text, for logs and tests.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { body } | Self::Buttons { body, .. } | Self::List { body, .. } => body,
        }
    }

    pub fn button_labels(&self) -> &[String] {
        match self {
            Self::Buttons { buttons, .. } => buttons,
            _ => &[],
        }
    }

    pub fn rows(&self) -> Vec<&ListRow> {
        match self {
            Self::List { sections, .. } => sections.iter().flat_map(|s| s.rows.iter()).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::string::ELLIPSIS;

    #[test]
    fn test_row_budgets() {
        let title = "Grilled Chicken Shawarma With Extra Garlic";
        let description = "d".repeat(200);
        let row = ListRow::new("food_1", title, Some(&description));

        assert_eq!(row.title.chars().count(), ROW_TITLE_BUDGET);
        assert!(row.title.ends_with(ELLIPSIS));
        let description = row.description.unwrap();
        assert_eq!(description.chars().count(), ROW_DESCRIPTION_BUDGET);
        assert!(description.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_short_row_untouched() {
        let row = ListRow::new("cat_1", "Rice", Some("Browse rice"));
        assert_eq!(row.title, "Rice");
        assert_eq!(row.description.as_deref(), Some("Browse rice"));
        assert_eq!(ListRow::new("x", "Rice", Some("")).description, None);
    }

    #[test]
    fn test_button_cap_and_label_budget() {
        let message = OutboundMessage::buttons(
            "Pick one",
            &["1", "2", "A very long custom amount label", "4"],
        );
        let labels = message.button_labels();
        assert_eq!(labels.len(), MAX_BUTTONS);
        assert_eq!(labels[2].chars().count(), BUTTON_LABEL_BUDGET);
        assert!(labels[2].ends_with(ELLIPSIS));
    }

    #[test]
    fn test_list_row_cap() {
        let rows = |n: usize| (0..n).map(|i| ListRow::new(format!("r{i}"), "x", None)).collect();
        let message = OutboundMessage::list(
            None,
            "Results",
            "Choose Option",
            vec![ListSection::new("A", rows(7)), ListSection::new("B", rows(7)), ListSection::new("C", rows(2))],
        );
        assert_eq!(message.rows().len(), MAX_LIST_ROWS);
        match message {
            OutboundMessage::List { sections, .. } => assert_eq!(sections.len(), 2),
            _ => panic!("expected list"),
        }
    }
}
