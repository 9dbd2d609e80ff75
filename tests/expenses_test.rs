mod common;

use anyhow::Result;
use common::{memory_service, test_service, SampleExpenses};
use spendbook::application::AppError;
use spendbook::domain::{DEFAULT_DESCRIPTION, MAX_AMOUNT_CENTS};

#[tokio::test]
async fn test_record_and_list_expenses() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let expense = service
        .record_expense(1, "50", "Food", Some("lunch".into()))
        .await?;
    assert_eq!(expense.user_id, 1);
    assert_eq!(expense.amount_cents, 5000);
    assert_eq!(expense.category, "Food");
    assert_eq!(expense.description, "lunch");

    let expenses = service.list_expenses(1).await?;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0], expense);

    Ok(())
}

#[tokio::test]
async fn test_list_in_insertion_order() -> Result<()> {
    let service = memory_service().await?;
    SampleExpenses::record(&service, 1).await?;

    let expenses = service.list_expenses(1).await?;
    assert_eq!(expenses.len(), 3);

    let descriptions: Vec<_> = expenses.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, ["lunch", "snack", "bus"]);

    // Sequence and timestamps never go backwards
    for pair in expenses.windows(2) {
        assert!(pair[0].sequence < pair[1].sequence);
        assert!(pair[0].created_at <= pair[1].created_at);
    }

    Ok(())
}

#[tokio::test]
async fn test_decimal_amounts() -> Result<()> {
    let service = memory_service().await?;

    let expense = service.record_expense(1, "12.5", "Food", None).await?;
    assert_eq!(expense.amount_cents, 1250);

    let expense = service.record_expense(1, "0,99", "Food", None).await?;
    assert_eq!(expense.amount_cents, 99);

    Ok(())
}

#[tokio::test]
async fn test_missing_description_uses_default() -> Result<()> {
    let service = memory_service().await?;

    service.record_expense(1, "10", "Other", None).await?;
    service
        .record_expense(1, "10", "Other", Some("   ".into()))
        .await?;

    let expenses = service.list_expenses(1).await?;
    assert!(expenses.iter().all(|e| e.description == DEFAULT_DESCRIPTION));

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_rejected() -> Result<()> {
    let service = memory_service().await?;
    service.record_expense(1, "5", "Food", None).await?;

    for amount in ["0", "-5", "-0.01", "0.001"] {
        let result = service.record_expense(1, amount, "Food", None).await;
        assert!(
            matches!(result, Err(AppError::InvalidAmount(_))),
            "{amount} should be rejected as InvalidAmount"
        );
    }

    let result = service.record_expense_cents(1, 0, "Food", None).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    // No rows were added by the rejected calls
    assert_eq!(service.list_expenses(1).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_oversized_amount_rejected() -> Result<()> {
    let service = memory_service().await?;

    let result = service
        .record_expense(1, "92233720368547758", "Food", None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service
        .record_expense_cents(1, MAX_AMOUNT_CENTS + 1, "Transport", None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    assert!(service.list_expenses(1).await?.is_empty());
    assert_eq!(service.total_spent(1).await?, 0);

    let expense = service.record_expense(1, "1000000000", "Food", None).await?;
    assert_eq!(expense.amount_cents, MAX_AMOUNT_CENTS);

    Ok(())
}

#[tokio::test]
async fn test_unparsable_amount_rejected() -> Result<()> {
    let service = memory_service().await?;

    for amount in ["abc", "", "12.34.56", "1e3", "nan"] {
        let result = service.record_expense(1, amount, "Food", None).await;
        match result {
            Err(err @ AppError::InvalidFormat(_)) => assert!(err.is_user_error()),
            other => panic!("{amount:?} should be InvalidFormat, got {other:?}"),
        }
    }

    assert!(service.list_expenses(1).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_category_rejected() -> Result<()> {
    let service = memory_service().await?;

    let result = service.record_expense(1, "10", "  ", None).await;
    assert!(matches!(result, Err(AppError::InvalidCategory(_))));
    assert!(service.list_expenses(1).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_any_category_accepted() -> Result<()> {
    let service = memory_service().await?;

    let expense = service.record_expense(1, "300", " Еда ", None).await?;
    assert_eq!(expense.category, " Еда ");

    let expense = service.record_expense(1, "15", "Books", None).await?;
    assert_eq!(expense.category, "Books");

    let long = "x".repeat(65);
    let expense = service.record_expense(1, "5", &long, None).await?;
    assert_eq!(expense.category, long);

    // Stored exactly as given
    let stored = service.list_expenses(1).await?;
    let categories: Vec<_> = stored.iter().map(|e| e.category.as_str()).collect();
    assert_eq!(categories, [" Еда ", "Books", long.as_str()]);

    Ok(())
}

#[tokio::test]
async fn test_list_by_category() -> Result<()> {
    let service = memory_service().await?;
    SampleExpenses::record(&service, 1).await?;

    let food = service.list_expenses_in_category(1, "Food").await?;
    assert_eq!(food.len(), 2);
    assert!(food.iter().all(|e| e.category == "Food"));

    let none = service.list_expenses_in_category(1, "Entertainment").await?;
    assert!(none.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_fresh_user_has_no_data() -> Result<()> {
    let service = memory_service().await?;

    assert!(service.list_expenses(42).await?.is_empty());
    assert!(service.category_totals(42).await?.is_empty());
    assert_eq!(service.current_budget(42).await?, None);
    assert_eq!(service.remaining_balance(42).await?, None);
    assert_eq!(service.total_spent(42).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_users_are_isolated() -> Result<()> {
    let service = memory_service().await?;
    SampleExpenses::record(&service, 1).await?;
    service
        .record_expense(2, "999", "Entertainment", Some("concert".into()))
        .await?;

    let first = service.list_expenses(1).await?;
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|e| e.user_id == 1));

    let second = service.list_expenses(2).await?;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].description, "concert");

    let totals = service.category_totals(2).await?;
    assert_eq!(totals.len(), 1);
    assert_eq!(totals.get("Entertainment"), Some(99900));
    assert_eq!(totals.get("Food"), None);

    Ok(())
}

#[tokio::test]
async fn test_data_survives_reconnect() -> Result<()> {
    let (service, temp) = test_service().await?;
    SampleExpenses::record(&service, 1).await?;
    service.set_budget(1, "1000").await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let reopened = spendbook::ExpenseService::connect(db_path.to_str().unwrap()).await?;
    assert_eq!(reopened.list_expenses(1).await?.len(), 3);
    assert_eq!(reopened.current_budget(1).await?, Some(100000));

    Ok(())
}
