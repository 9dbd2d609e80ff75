use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::application::CategoryAggregate;
use crate::domain::{
    Budget, BudgetChange, CategoryTotals, Cents, Expense, NewExpense, UserId,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_BUDGETS};

const EXPENSE_COLUMNS: &str =
    "seq, id, user_id, amount_cents, category, description, created_at";

/// Repository for persisting and querying expenses and budgets.
/// Every query is scoped to a single user.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// Timestamps are stored as fixed-width RFC 3339 strings so that text
/// comparison in SQL matches chronological order.
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create a private, migrated in-memory database.
    /// The pool is pinned to one connection that is never recycled, since
    /// each SQLite in-memory connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_BUDGETS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Expense operations
    // ========================

    /// Append an expense and return it as stored.
    ///
    /// The timestamp is assigned here, clamped so it never precedes the
    /// user's latest entry. Insert and clamp run as a single statement.
    pub async fn save_expense(&self, expense: NewExpense) -> Result<Expense> {
        let now = format_timestamp(Utc::now());

        let row = sqlx::query(
            r#"
            INSERT INTO expenses (id, user_id, amount_cents, category, description, created_at)
            SELECT ?, ?, ?, ?, ?,
                MAX(?, COALESCE((SELECT MAX(created_at) FROM expenses WHERE user_id = ?), ''))
            RETURNING seq, created_at
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.user_id)
        .bind(expense.amount_cents)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(&now)
        .bind(expense.user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save expense")?;

        let sequence: i64 = row.get("seq");
        let created_at_str: String = row.get("created_at");
        let created_at = parse_timestamp(&created_at_str)?;

        debug!(
            "stored expense {} (seq {}) for user {}",
            expense.id, sequence, expense.user_id
        );

        Ok(expense.into_expense(sequence, created_at))
    }

    /// List all expenses of a user in insertion order.
    pub async fn list_expenses(&self, user_id: UserId) -> Result<Vec<Expense>> {
        let query = format!(
            "SELECT {} FROM expenses WHERE user_id = ? ORDER BY seq",
            EXPENSE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// List a user's expenses in one category, in insertion order.
    pub async fn list_expenses_in_category(
        &self,
        user_id: UserId,
        category: &str,
    ) -> Result<Vec<Expense>> {
        let query = format!(
            "SELECT {} FROM expenses WHERE user_id = ? AND category = ? ORDER BY seq",
            EXPENSE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(category)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list expenses by category")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// Sum of every expense amount of a user (0 when there are none).
    pub async fn total_spent(&self, user_id: UserId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM expenses
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute total spent")?;

        Ok(row.get("total"))
    }

    /// Sum amounts per category using SQL aggregation.
    pub async fn category_totals(&self, user_id: UserId) -> Result<CategoryTotals> {
        let rows = sqlx::query(
            r#"
            SELECT category, SUM(amount_cents) as total
            FROM expenses
            WHERE user_id = ?
            GROUP BY category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute category totals")?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("category"), row.get::<Cents, _>("total")))
            .collect())
    }

    /// Per-category count and sum, the raw material for reports.
    pub async fn category_aggregates(&self, user_id: UserId) -> Result<Vec<CategoryAggregate>> {
        let rows = sqlx::query(
            r#"
            SELECT category, COUNT(*) as count, SUM(amount_cents) as total
            FROM expenses
            WHERE user_id = ?
            GROUP BY category
            ORDER BY total DESC, category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate categories")?;

        Ok(rows
            .iter()
            .map(|row| CategoryAggregate {
                category: row.get("category"),
                count: row.get("count"),
                total: row.get("total"),
            })
            .collect())
    }

    fn row_to_expense(row: &SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            sequence: row.get("seq"),
            user_id: row.get("user_id"),
            amount_cents: row.get("amount_cents"),
            category: row.get("category"),
            description: row.get("description"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Budget operations
    // ========================

    /// Replace the user's current budget and append the change to the history.
    /// Both writes commit together or not at all.
    pub async fn save_budget(&self, user_id: UserId, amount_cents: Cents) -> Result<Budget> {
        let now = Utc::now();
        let now_str = format_timestamp(now);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin budget transaction")?;

        sqlx::query(
            r#"
            INSERT INTO budgets (user_id, amount_cents, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                amount_cents = excluded.amount_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount_cents)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .context("Failed to save budget")?;

        sqlx::query("INSERT INTO budget_history (user_id, amount_cents, set_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(amount_cents)
            .bind(&now_str)
            .execute(&mut *tx)
            .await
            .context("Failed to record budget history")?;

        tx.commit().await.context("Failed to commit budget")?;

        debug!("stored budget {} for user {}", amount_cents, user_id);

        Ok(Budget {
            user_id,
            amount_cents,
            updated_at: parse_timestamp(&now_str)?,
        })
    }

    /// Get the budget currently in force for a user.
    pub async fn get_budget(&self, user_id: UserId) -> Result<Option<Budget>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, amount_cents, updated_at
            FROM budgets
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        match row {
            Some(row) => {
                let updated_at_str: String = row.get("updated_at");
                Ok(Some(Budget {
                    user_id: row.get("user_id"),
                    amount_cents: row.get("amount_cents"),
                    updated_at: parse_timestamp(&updated_at_str)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// List every budget the user has set, oldest first.
    pub async fn list_budget_history(&self, user_id: UserId) -> Result<Vec<BudgetChange>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, user_id, amount_cents, set_at
            FROM budget_history
            WHERE user_id = ?
            ORDER BY seq
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list budget history")?;

        rows.iter()
            .map(|row| {
                let set_at_str: String = row.get("set_at");
                Ok(BudgetChange {
                    sequence: row.get("seq"),
                    user_id: row.get("user_id"),
                    amount_cents: row.get("amount_cents"),
                    set_at: parse_timestamp(&set_at_str)?,
                })
            })
            .collect()
    }
}
