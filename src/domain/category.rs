use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Cents;

/// Categories offered as shortcuts by the front end. Any other non-empty
/// label is accepted as well.
pub const SUGGESTED_CATEGORIES: [&str; 4] = ["Food", "Transport", "Entertainment", "Other"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("category must not be empty")]
    Empty,
}

/// Any label with at least one non-whitespace character is a valid category.
/// The label is stored exactly as given.
pub fn validate_category(category: &str) -> Result<(), CategoryError> {
    if category.trim().is_empty() {
        return Err(CategoryError::Empty);
    }
    Ok(())
}

/// Summed amount per category for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTotals(HashMap<String, Cents>);

impl CategoryTotals {
    pub fn get(&self, category: &str) -> Option<Cents> {
        self.0.get(category).copied()
    }

    /// Sum over every category.
    pub fn total(&self) -> Cents {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Cents)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Cents)> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = (String, Cents)>>(iter: I) -> Self {
        let mut totals = HashMap::new();
        for (category, amount) in iter {
            *totals.entry(category).or_insert(0) += amount;
        }
        Self(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_category() {
        assert_eq!(validate_category("Food"), Ok(()));
        assert_eq!(validate_category("Еда"), Ok(()));
        assert_eq!(validate_category(" Food "), Ok(()));
        assert_eq!(validate_category(&"x".repeat(500)), Ok(()));
        assert_eq!(validate_category(""), Err(CategoryError::Empty));
        assert_eq!(validate_category(" \t "), Err(CategoryError::Empty));
    }

    #[test]
    fn test_totals_from_iter_accumulates() {
        let totals: CategoryTotals = vec![
            ("Food".to_string(), 5000),
            ("Food".to_string(), 3000),
            ("Transport".to_string(), 2000),
        ]
        .into_iter()
        .collect();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals.get("Food"), Some(8000));
        assert_eq!(totals.get("Transport"), Some(2000));
        assert_eq!(totals.get("Other"), None);
        assert_eq!(totals.total(), 10000);
    }

    #[test]
    fn test_empty_totals() {
        let totals = CategoryTotals::default();
        assert!(totals.is_empty());
        assert_eq!(totals.total(), 0);
    }
}
