//! Core category domain types.

use std::fmt::Display;

use serde::Serialize;

/// The name of a category.
///
/// Names only come from the seeded categories in the database, so they are
/// never checked again here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
#[serde(into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A named grouping for expenses shared by all users, e.g. 'Food' or 'Housing'.
///
/// Serializes to `{"name": ...}`, the shape clients see nested in an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Hash)]
pub struct Category {
    /// The category's ID in the application database.
    #[serde(skip_serializing)]
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: CategoryName,
}

#[cfg(test)]
mod category_name_tests {
    use serde_json::json;

    use super::{Category, CategoryName};

    #[test]
    fn category_serializes_as_name_only() {
        let category = Category {
            id: 4,
            name: CategoryName::new_unchecked("Utilities"),
        };

        assert_eq!(
            serde_json::to_value(&category).unwrap(),
            json!({"name": "Utilities"})
        );
    }
}
