use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use crate::application::ExpenseService;
use crate::domain::{format_cents, Budget, BudgetChange, Cents, Expense, UserId};

/// Everything stored for one user, for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user_id: UserId,
    pub expenses: Vec<Expense>,
    pub budget: Option<Budget>,
    pub budget_history: Vec<BudgetChange>,
}

/// Exporter for converting a user's expense book to various formats
pub struct Exporter<'a> {
    service: &'a ExpenseService,
    user_id: UserId,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a ExpenseService, user_id: UserId) -> Self {
        Self { service, user_id }
    }

    /// Export expenses to CSV format, in insertion order
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(self.user_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "created_at",
            "amount",
            "amount_cents",
            "category",
            "description",
        ])?;

        for expense in &expenses {
            csv_writer.write_record([
                expense.id.to_string(),
                expense.created_at.to_rfc3339(),
                format_cents(expense.amount_cents),
                expense.amount_cents.to_string(),
                expense.category.clone(),
                expense.description.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export per-category totals to CSV format, largest first
    pub async fn export_totals_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let report = self.service.category_report(self.user_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["category", "total", "total_cents", "count"])?;

        for summary in &report.categories {
            csv_writer.write_record([
                summary.category.clone(),
                format_cents(summary.total),
                summary.total.to_string(),
                summary.count.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.categories.len())
    }

    /// Export expenses as a JSON array, in insertion order
    pub async fn export_expenses_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(self.user_id).await?;

        serde_json::to_writer_pretty(&mut writer, &expenses)?;
        writer.flush()?;
        Ok(expenses.len())
    }

    /// Export per-category totals (in cents) as a JSON object keyed by category
    pub async fn export_totals_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let totals = self.service.category_totals(self.user_id).await?;
        let sorted: BTreeMap<&str, Cents> = totals.iter().collect();

        serde_json::to_writer_pretty(&mut writer, &sorted)?;
        writer.flush()?;
        Ok(sorted.len())
    }

    /// Export everything stored for the user as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<UserSnapshot> {
        let snapshot = UserSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            user_id: self.user_id,
            expenses: self.service.list_expenses(self.user_id).await?,
            budget: self.service.get_budget(self.user_id).await?,
            budget_history: self.service.budget_history(self.user_id).await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
