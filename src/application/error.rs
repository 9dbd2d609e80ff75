use thiserror::Error;

use crate::domain::CategoryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount format: '{0}' (use '50.00' or '50')")]
    InvalidFormat(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(#[from] CategoryError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// Validation errors are recoverable: the caller should ask the user
    /// to correct the input. Everything else is a storage failure.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AppError::Database(_))
    }
}
