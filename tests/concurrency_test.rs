mod common;

use anyhow::Result;
use common::test_service;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_users_do_not_interfere() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut handles = Vec::new();
    for user in 1..=4_i64 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            for i in 1..=10_i64 {
                service
                    .record_expense_cents(user, user * 100 + i, "Food", Some(format!("#{i}")))
                    .await?;
            }
            service.set_budget_cents(user, user * 10000).await?;
            anyhow::Ok(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    for user in 1..=4_i64 {
        let expenses = service.list_expenses(user).await?;
        assert_eq!(expenses.len(), 10);
        assert!(expenses.iter().all(|e| e.user_id == user));

        // Each user's rows kept their own order
        let descriptions: Vec<_> = expenses.iter().map(|e| e.description.clone()).collect();
        let expected: Vec<_> = (1..=10).map(|i| format!("#{i}")).collect();
        assert_eq!(descriptions, expected);

        let expected_total: i64 = (1..=10).map(|i| user * 100 + i).sum();
        assert_eq!(service.category_totals(user).await?.total(), expected_total);
        assert_eq!(service.current_budget(user).await?, Some(user * 10000));
    }

    Ok(())
}

#[tokio::test]
async fn test_in_memory_services_are_isolated() -> Result<()> {
    let first = spendbook::ExpenseService::in_memory().await?;
    let second = spendbook::ExpenseService::in_memory().await?;

    first.record_expense(1, "10", "Food", None).await?;

    assert_eq!(first.list_expenses(1).await?.len(), 1);
    assert!(second.list_expenses(1).await?.is_empty());

    Ok(())
}
