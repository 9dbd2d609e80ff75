mod repository;

pub use repository::*;

/// SQL migration for the expenses table
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for budgets and their history
pub const MIGRATION_002_BUDGETS: &str = include_str!("migrations/002_budgets.sql");
