// Application layer - the operations a front end calls:
// recording expenses, aggregating them, tracking the budget.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
