// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use spendbook::application::ExpenseService;
use spendbook::domain::UserId;
use tempfile::TempDir;

/// Helper to create a test service with a temporary on-disk database
pub async fn test_service() -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ExpenseService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service over a private in-memory database
pub async fn memory_service() -> Result<ExpenseService> {
    Ok(ExpenseService::in_memory().await?)
}

/// Test fixture: the lunch / snack / bus scenario
pub struct SampleExpenses;

impl SampleExpenses {
    /// Food 50 + 30, Transport 20
    pub async fn record(service: &ExpenseService, user: UserId) -> Result<()> {
        service
            .record_expense(user, "50", "Food", Some("lunch".into()))
            .await?;
        service
            .record_expense(user, "30", "Food", Some("snack".into()))
            .await?;
        service
            .record_expense(user, "20", "Transport", Some("bus".into()))
            .await?;
        Ok(())
    }
}
