use std::fs::File;
use std::io::{stdout, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use crate::application::{CategoryReport, ExpenseService};
use crate::domain::{format_cents, Expense, UserId, SUGGESTED_CATEGORIES};
use crate::io::Exporter;

const CHART_WIDTH: usize = 40;

/// Spendbook - personal expense tracker
#[derive(Parser)]
#[command(name = "spendbook")]
#[command(about = "Record expenses by category, chart them and keep an eye on a monthly budget")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SPENDBOOK_DATABASE", default_value = "expenses.db")]
    pub database: String,

    /// User the records belong to
    #[arg(short, long, env = "SPENDBOOK_USER", default_value_t = 1)]
    pub user: UserId,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Show a greeting with the available commands and categories
    Start,

    /// Record an expense
    Add {
        /// Amount spent (e.g., "50.00" or "50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category (e.g., Food, Transport, Entertainment, Other)
        #[arg(short, long)]
        category: String,

        /// Free-text description
        description: Vec<String>,
    },

    /// List recorded expenses
    Expenses {
        /// Only show one category
        #[arg(short, long)]
        category: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Spending per category
    CategoryReport {
        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Chart)]
        format: ReportFormat,
    },

    /// Set the monthly budget
    SetBudget {
        /// Budget amount (e.g., "1000" or "1000.00")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Show the current budget and what is left of it
    Budget {
        /// List every budget that was set
        #[arg(long)]
        history: bool,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format (default: csv for expenses and totals, json for full)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Chart,
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    Expenses,
    Totals,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    /// `RUST_LOG` takes precedence; otherwise `--verbose` enables debug output.
    pub fn init_logging(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    }

    pub async fn run(self) -> Result<()> {
        let Cli {
            database,
            user,
            command,
            ..
        } = self;
        let mut out = stdout();

        match command {
            Commands::Init => {
                ExpenseService::init(&database).await?;
                writeln!(out, "Database initialized: {}", database)?;
            }

            Commands::Start => write_greeting(&mut out)?,

            Commands::Add {
                amount,
                category,
                description,
            } => {
                let service = ExpenseService::init(&database).await?;
                let description = (!description.is_empty()).then(|| description.join(" "));

                let expense = service
                    .record_expense(user, &amount, &category, description)
                    .await?;

                writeln!(out, "Expense of {} added.", format_cents(expense.amount_cents))?;
                writeln!(out, "Category: {}", expense.category)?;
                writeln!(out, "Description: {}", expense.description)?;
            }

            Commands::Expenses { category, format } => {
                let service = ExpenseService::init(&database).await?;
                let expenses = match category {
                    Some(category) => service.list_expenses_in_category(user, &category).await?,
                    None => service.list_expenses(user).await?,
                };
                write_expenses(&mut out, &expenses, format)?;
            }

            Commands::CategoryReport { format } => {
                let service = ExpenseService::init(&database).await?;
                let report = service.category_report(user).await?;
                write_category_report(&mut out, &report, format)?;
            }

            Commands::SetBudget { amount } => {
                let service = ExpenseService::init(&database).await?;
                let budget = service.set_budget(user, &amount).await?;
                writeln!(out, "Monthly budget set: {}", format_cents(budget.amount_cents))?;
            }

            Commands::Budget { history } => {
                let service = ExpenseService::init(&database).await?;
                run_budget_command(&mut out, &service, user, history).await?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = ExpenseService::init(&database).await?;
                let format = resolve_export_format(export_type, format)?;
                run_export_command(&service, user, export_type, format, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

fn write_greeting<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Hi! I keep track of your expenses.")?;
    writeln!(out)?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  add <amount> -c <category> [description]   record an expense")?;
    writeln!(out, "  expenses                                    list all expenses")?;
    writeln!(out, "  category-report                             chart spending by category")?;
    writeln!(out, "  set-budget <amount>                         set the monthly budget")?;
    writeln!(out, "  budget                                      show what is left of the budget")?;
    writeln!(out)?;
    writeln!(out, "Categories: {}", SUGGESTED_CATEGORIES.join(", "))?;
    Ok(())
}

fn write_expenses<W: Write>(out: &mut W, expenses: &[Expense], format: ListFormat) -> Result<()> {
    if format == ListFormat::Json {
        serde_json::to_writer_pretty(&mut *out, expenses)?;
        writeln!(out)?;
        return Ok(());
    }

    if expenses.is_empty() {
        writeln!(out, "No expenses to display.")?;
        return Ok(());
    }

    writeln!(out, "Your expenses:")?;
    writeln!(
        out,
        "{:>12} {:<15} {:<30} {:<19}",
        "AMOUNT", "CATEGORY", "DESCRIPTION", "DATE"
    )?;
    writeln!(out, "{}", "-".repeat(79))?;
    for expense in expenses {
        writeln!(
            out,
            "{:>12} {:<15} {:<30} {:<19}",
            format_cents(expense.amount_cents),
            truncate(&expense.category, 15),
            truncate(&expense.description, 30),
            expense.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    writeln!(out, "{}", "-".repeat(79))?;
    let total: i64 = expenses.iter().map(|e| e.amount_cents).sum();
    writeln!(out, "{:>12} TOTAL", format_cents(total))?;
    Ok(())
}

fn write_category_report<W: Write>(
    out: &mut W,
    report: &CategoryReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        ReportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(&mut *out);
            csv_writer.write_record(["category", "total", "count", "average", "percentage"])?;
            for cat in &report.categories {
                csv_writer.write_record([
                    cat.category.clone(),
                    cat.total.to_string(),
                    cat.count.to_string(),
                    cat.average.to_string(),
                    format!("{:.2}", cat.percentage),
                ])?;
            }
            csv_writer.flush()?;
        }
        ReportFormat::Table => {
            if report.is_empty() {
                writeln!(out, "No category data.")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<20} {:>12} {:>8} {:>12} {:>8}",
                "CATEGORY", "TOTAL", "COUNT", "AVERAGE", "PERCENT"
            )?;
            writeln!(out, "{}", "-".repeat(65))?;
            for cat in &report.categories {
                writeln!(
                    out,
                    "{:<20} {:>12} {:>8} {:>12} {:>7.1}%",
                    truncate(&cat.category, 20),
                    format_cents(cat.total),
                    cat.count,
                    format_cents(cat.average),
                    cat.percentage
                )?;
            }
            writeln!(out, "{}", "-".repeat(65))?;
            writeln!(out, "{:<20} {:>12}", "TOTAL", format_cents(report.total))?;
        }
        ReportFormat::Chart => {
            if report.is_empty() {
                writeln!(out, "No category data.")?;
                return Ok(());
            }
            writeln!(out, "Expenses by category")?;
            writeln!(out)?;
            for line in render_bar_chart(report, CHART_WIDTH) {
                writeln!(out, "{}", line)?;
            }
        }
    }
    Ok(())
}

/// Horizontal bar chart, one line per category, bars scaled to the largest total.
fn render_bar_chart(report: &CategoryReport, width: usize) -> Vec<String> {
    let max = report
        .categories
        .iter()
        .map(|c| c.total)
        .max()
        .unwrap_or(0);
    let label_width = report
        .categories
        .iter()
        .map(|c| c.category.chars().count().min(20))
        .max()
        .unwrap_or(0);

    report
        .categories
        .iter()
        .map(|cat| {
            let len = if max > 0 {
                ((cat.total as f64 / max as f64) * width as f64).round() as usize
            } else {
                0
            };
            format!(
                "{:<label_width$} | {:<width$} {}",
                truncate(&cat.category, 20),
                "#".repeat(len.max(1)),
                format_cents(cat.total),
            )
        })
        .collect()
}

async fn run_budget_command<W: Write>(
    out: &mut W,
    service: &ExpenseService,
    user: UserId,
    history: bool,
) -> Result<()> {
    if history {
        let changes = service.budget_history(user).await?;
        if changes.is_empty() {
            writeln!(out, "No budget has been set.")?;
        } else {
            writeln!(out, "{:<20} {:>12}", "SET AT", "AMOUNT")?;
            writeln!(out, "{}", "-".repeat(33))?;
            for change in changes {
                writeln!(
                    out,
                    "{:<20} {:>12}",
                    change.set_at.format("%Y-%m-%d %H:%M:%S"),
                    format_cents(change.amount_cents)
                )?;
            }
        }
        return Ok(());
    }

    match service.budget_status(user).await? {
        None => writeln!(out, "No budget has been set. Use: set-budget <amount>")?,
        Some(status) => {
            writeln!(out, "Monthly budget: {:>12}", format_cents(status.budget.amount_cents))?;
            writeln!(out, "Spent:          {:>12}", format_cents(status.spent))?;
            writeln!(out, "{}", "-".repeat(28))?;
            writeln!(out, "Remaining:      {:>12}", format_cents(status.remaining))?;
            if status.is_over_budget() {
                writeln!(out, "Over budget ({:.1}% used).", status.percent_used)?;
            } else {
                writeln!(out, "{:.1}% of the budget used.", status.percent_used)?;
            }
        }
    }
    Ok(())
}

/// Full snapshots are JSON only; the tabular exports default to CSV.
fn resolve_export_format(
    export_type: ExportType,
    format: Option<ExportFormat>,
) -> Result<ExportFormat> {
    match (export_type, format) {
        (ExportType::Full, Some(ExportFormat::Csv)) => {
            anyhow::bail!("The full export is only available as JSON")
        }
        (ExportType::Full, _) => Ok(ExportFormat::Json),
        (_, Some(format)) => Ok(format),
        (_, None) => Ok(ExportFormat::Csv),
    }
}

async fn run_export_command(
    service: &ExpenseService,
    user: UserId,
    export_type: ExportType,
    format: ExportFormat,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service, user);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match (export_type, format) {
        (ExportType::Expenses, ExportFormat::Csv) => {
            let count = exporter.export_expenses_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        (ExportType::Expenses, ExportFormat::Json) => {
            let count = exporter.export_expenses_json(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        (ExportType::Totals, ExportFormat::Csv) => {
            let count = exporter.export_totals_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} category totals", count);
            }
        }
        (ExportType::Totals, ExportFormat::Json) => {
            let count = exporter.export_totals_json(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} category totals", count);
            }
        }
        (ExportType::Full, _) => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} expenses and {} budget changes",
                    snapshot.expenses.len(),
                    snapshot.budget_history.len()
                );
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
