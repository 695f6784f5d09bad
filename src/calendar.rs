//! Calendar and category containers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{Event, PopulatedEvent};

/// Category key assigned to events whose source document carries no
/// category information (the interchange format has no native concept).
pub const DEFAULT_CATEGORY_UID: &str = "0";

/// A named, colored grouping of events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub uid: String,
    pub name: String,
    pub color: String,
    /// Whether the category is shown in the grid; persisted when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Category {
    /// The synthesized fallback category every parsed calendar carries.
    pub fn uncategorized() -> Self {
        Category {
            uid: DEFAULT_CATEGORY_UID.to_string(),
            name: "Uncategorized".to_string(),
            color: "blue".to_string(),
            enabled: None,
        }
    }
}

/// The compact persisted calendar: flat uid-keyed maps, no derived data.
///
/// Produced by a successful parse, immutable until it goes back through
/// the populate/unpopulate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub events: HashMap<String, Event>,
    pub categories: HashMap<String, Category>,
}

impl Calendar {
    /// An empty calendar holding only the default category.
    pub fn new() -> Self {
        let mut categories = HashMap::new();
        categories.insert(DEFAULT_CATEGORY_UID.to_string(), Category::uncategorized());
        Calendar {
            events: HashMap::new(),
            categories,
        }
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::new()
    }
}

/// The editing-layer calendar: same maps, but events carry resolved
/// categories and occurrence-rendering fields. Mutated freely by the UI
/// and collapsed back to a [`Calendar`] by `unpopulate` before saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedCalendar {
    pub events: HashMap<String, PopulatedEvent>,
    pub categories: HashMap<String, Category>,
}
