// 🏷️ Category Entity - fixed classification tags for expenses
//
// Expenses store the category id as a plain string. Unknown ids are
// tolerated everywhere; only display lookups care about this table.

use serde::Serialize;

/// Display metadata for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    /// Stored id (e.g. "food")
    pub id: &'static str,

    /// Display name (e.g. "Food & Dining")
    pub name: &'static str,

    /// UI color tag
    pub color: &'static str,
}

/// Label used in chart series when a stored id has no table entry
pub const UNKNOWN_CATEGORY_NAME: &str = "Unknown";

pub const EXPENSE_CATEGORIES: &[CategoryInfo] = &[
    CategoryInfo { id: "food", name: "Food & Dining", color: "orange" },
    CategoryInfo { id: "transportation", name: "Transportation", color: "blue" },
    CategoryInfo { id: "entertainment", name: "Entertainment", color: "purple" },
    CategoryInfo { id: "shopping", name: "Shopping", color: "pink" },
    CategoryInfo { id: "utilities", name: "Utilities", color: "teal" },
    CategoryInfo { id: "health", name: "Health", color: "green" },
    CategoryInfo { id: "education", name: "Education", color: "indigo" },
    CategoryInfo { id: "other", name: "Other", color: "gray" },
];

/// Look up a category by its stored id (exact match)
pub fn find_category(id: &str) -> Option<&'static CategoryInfo> {
    EXPENSE_CATEGORIES.iter().find(|c| c.id == id)
}

/// Display name, falling back to "Unknown"
pub fn category_display_name(id: &str) -> &'static str {
    find_category(id).map_or(UNKNOWN_CATEGORY_NAME, |c| c.name)
}

/// Display name, falling back to the raw id (CSV export convention)
pub fn category_label(id: &str) -> &str {
    match find_category(id) {
        Some(info) => info.name,
        None => id,
    }
}

pub fn is_known_category(id: &str) -> bool {
    find_category(id).is_some()
}
