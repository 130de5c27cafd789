use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    /// Human-readable delivery estimate, e.g. "30-45 mins".
    pub delivery_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A food item as the conversation sees it, with its restaurant folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Unit price in minor units.
    pub price: i64,
    pub category_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub delivery_time: String,
    pub preparation_time: String,
    pub tags: Vec<String>,
    pub is_available: bool,
}

impl FoodItem {
    /// Case-insensitive match against name, description and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}

fn default_true() -> bool {
    true
}
