use chrono::Utc;
use log::info;

use crate::domain::{
    parse_cents, validate_amount, validate_category, Budget, BudgetChange, CategoryTotals, Cents,
    Expense, NewExpense, UserId,
};
use crate::storage::Repository;

use super::{AppError, BudgetStatus, CategoryReport};

/// Application service providing the expense book operations.
/// This is the primary interface for any front end (CLI, chat bot, API, etc.).
///
/// The service holds no state besides its repository, so a single instance
/// can be shared by concurrent requests from different users.
#[derive(Clone)]
pub struct ExpenseService {
    repo: Repository,
}

impl ExpenseService {
    /// Create a new expense service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) and migrate the database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Service over a private in-memory database.
    pub async fn in_memory() -> Result<Self, AppError> {
        Ok(Self::new(Repository::in_memory().await?))
    }

    // ========================
    // Ledger operations
    // ========================

    /// Record an expense from raw user input.
    ///
    /// Fails with `InvalidFormat` when the amount is not a number and with
    /// `InvalidAmount` when it is not positive or exceeds `MAX_AMOUNT_CENTS`.
    /// Nothing is stored on failure.
    pub async fn record_expense(
        &self,
        user_id: UserId,
        amount: &str,
        category: &str,
        description: Option<String>,
    ) -> Result<Expense, AppError> {
        let amount_cents = parse_cents(amount).map_err(|_| {
            info!("rejected expense amount {:?} for user {}", amount, user_id);
            AppError::InvalidFormat(amount.trim().to_string())
        })?;

        self.record_expense_cents(user_id, amount_cents, category, description)
            .await
    }

    /// Record an expense whose amount is already in cents.
    pub async fn record_expense_cents(
        &self,
        user_id: UserId,
        amount_cents: Cents,
        category: &str,
        description: Option<String>,
    ) -> Result<Expense, AppError> {
        let amount_cents = validate_amount(amount_cents).map_err(|err| {
            info!("rejected expense amount {} for user {}", amount_cents, user_id);
            AppError::InvalidAmount(format!("expense {}", err))
        })?;
        validate_category(category)?;

        let expense = self
            .repo
            .save_expense(NewExpense::new(
                user_id,
                amount_cents,
                category.to_string(),
                description,
            ))
            .await?;

        info!(
            "user {} recorded expense {} in {}",
            user_id, expense.id, expense.category
        );
        Ok(expense)
    }

    /// All expenses of a user in the order they were recorded.
    pub async fn list_expenses(&self, user_id: UserId) -> Result<Vec<Expense>, AppError> {
        Ok(self.repo.list_expenses(user_id).await?)
    }

    /// Expenses of a user in a single category, in the order they were recorded.
    pub async fn list_expenses_in_category(
        &self,
        user_id: UserId,
        category: &str,
    ) -> Result<Vec<Expense>, AppError> {
        validate_category(category)?;
        Ok(self
            .repo
            .list_expenses_in_category(user_id, category)
            .await?)
    }

    /// Sum of every expense of a user.
    pub async fn total_spent(&self, user_id: UserId) -> Result<Cents, AppError> {
        Ok(self.repo.total_spent(user_id).await?)
    }

    // ========================
    // Aggregation
    // ========================

    /// Summed amount per category. Empty when the user has no expenses.
    pub async fn category_totals(&self, user_id: UserId) -> Result<CategoryTotals, AppError> {
        Ok(self.repo.category_totals(user_id).await?)
    }

    /// Per-category totals with counts, averages and shares of overall spend.
    pub async fn category_report(&self, user_id: UserId) -> Result<CategoryReport, AppError> {
        let aggregates = self.repo.category_aggregates(user_id).await?;
        Ok(CategoryReport::from_aggregates(aggregates, Utc::now()))
    }

    // ========================
    // Budget operations
    // ========================

    /// Set the user's monthly budget from raw user input.
    /// The new value replaces the current one; the change is kept in the history.
    pub async fn set_budget(&self, user_id: UserId, amount: &str) -> Result<Budget, AppError> {
        let amount_cents = parse_cents(amount).map_err(|_| {
            info!("rejected budget amount {:?} for user {}", amount, user_id);
            AppError::InvalidFormat(amount.trim().to_string())
        })?;

        self.set_budget_cents(user_id, amount_cents).await
    }

    /// Set the user's monthly budget in cents.
    pub async fn set_budget_cents(
        &self,
        user_id: UserId,
        amount_cents: Cents,
    ) -> Result<Budget, AppError> {
        let amount_cents = validate_amount(amount_cents).map_err(|err| {
            info!("rejected budget amount {} for user {}", amount_cents, user_id);
            AppError::InvalidAmount(format!("budget {}", err))
        })?;

        let budget = self.repo.save_budget(user_id, amount_cents).await?;
        info!("user {} set budget to {}", user_id, amount_cents);
        Ok(budget)
    }

    /// The budget currently in force, if the user ever set one.
    pub async fn get_budget(&self, user_id: UserId) -> Result<Option<Budget>, AppError> {
        Ok(self.repo.get_budget(user_id).await?)
    }

    /// Amount of the budget currently in force.
    pub async fn current_budget(&self, user_id: UserId) -> Result<Option<Cents>, AppError> {
        Ok(self.get_budget(user_id).await?.map(|b| b.amount_cents))
    }

    /// Every budget the user has set, oldest first.
    pub async fn budget_history(&self, user_id: UserId) -> Result<Vec<BudgetChange>, AppError> {
        Ok(self.repo.list_budget_history(user_id).await?)
    }

    /// Current budget minus everything spent. `None` when no budget is set;
    /// negative when the user has overspent.
    pub async fn remaining_balance(&self, user_id: UserId) -> Result<Option<Cents>, AppError> {
        Ok(self
            .budget_status(user_id)
            .await?
            .map(|status| status.remaining))
    }

    /// Budget compared against total spending. `None` when no budget is set.
    pub async fn budget_status(&self, user_id: UserId) -> Result<Option<BudgetStatus>, AppError> {
        let Some(budget) = self.repo.get_budget(user_id).await? else {
            return Ok(None);
        };
        let spent = self.repo.total_spent(user_id).await?;
        Ok(Some(BudgetStatus::new(budget, spent)))
    }
}
