use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, UserId};

/// The budget ceiling currently in force for a user.
/// Each user has at most one; setting a new one replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub user_id: UserId,
    pub amount_cents: Cents,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the append-only audit trail of budget changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetChange {
    pub sequence: i64,
    pub user_id: UserId,
    pub amount_cents: Cents,
    pub set_at: DateTime<Utc>,
}

impl Budget {
    /// Remaining balance after `spent`. Negative when overspent.
    pub fn remaining(&self, spent: Cents) -> Cents {
        self.amount_cents - spent
    }

    /// Share of the budget already used, in percent.
    pub fn percent_used(&self, spent: Cents) -> f64 {
        if self.amount_cents <= 0 {
            return 0.0;
        }
        spent as f64 / self.amount_cents as f64 * 100.0
    }
}
