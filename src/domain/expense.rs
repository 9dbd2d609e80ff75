use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type ExpenseId = Uuid;

/// Opaque identifier of the user owning a record (a chat/user id on most platforms).
pub type UserId = i64;

/// Stored when an expense is recorded without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// A single spending record. Expenses are append-only: once stored they are
/// never edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Insertion order within the store, assigned by the repository
    pub sequence: i64,
    pub user_id: UserId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub category: String,
    pub description: String,
    /// Assigned by the repository at insertion time
    pub created_at: DateTime<Utc>,
}

/// A validated expense that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub amount_cents: Cents,
    pub category: String,
    pub description: String,
}

impl NewExpense {
    /// Callers are expected to pass an already validated amount and category;
    /// a blank or missing description falls back to [`DEFAULT_DESCRIPTION`].
    pub fn new(
        user_id: UserId,
        amount_cents: Cents,
        category: String,
        description: Option<String>,
    ) -> Self {
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        Self {
            id: Uuid::new_v4(),
            user_id,
            amount_cents,
            category,
            description,
        }
    }

    pub fn into_expense(self, sequence: i64, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id: self.id,
            sequence,
            user_id: self.user_id,
            amount_cents: self.amount_cents,
            category: self.category,
            description: self.description,
            created_at,
        }
    }
}
