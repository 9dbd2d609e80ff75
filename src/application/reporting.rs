use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Budget, Cents};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub generated_at: DateTime<Utc>,
    /// Sorted by total, largest first
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    pub average: Cents,
    pub percentage: f64,
}

impl CategoryReport {
    pub fn from_aggregates(aggregates: Vec<CategoryAggregate>, generated_at: DateTime<Utc>) -> Self {
        let total: Cents = aggregates.iter().map(|a| a.total).sum();

        let mut categories: Vec<CategorySummary> = aggregates
            .into_iter()
            .map(|agg| CategorySummary {
                average: if agg.count > 0 { agg.total / agg.count } else { 0 },
                percentage: if total > 0 {
                    agg.total as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                category: agg.category,
                total: agg.total,
                count: agg.count,
            })
            .collect();

        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        Self {
            generated_at,
            categories,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Budget ceiling compared against everything spent so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub spent: Cents,
    pub remaining: Cents,
    pub percent_used: f64,
}

impl BudgetStatus {
    pub fn new(budget: Budget, spent: Cents) -> Self {
        Self {
            remaining: budget.remaining(spent),
            percent_used: budget.percent_used(spent),
            budget,
            spent,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0
    }
}

// Helper struct for repository aggregation
#[derive(Debug, Clone)]
pub struct CategoryAggregate {
    pub category: String,
    pub count: i64,
    pub total: Cents,
}
