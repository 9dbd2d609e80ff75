mod budget;
mod category;
mod expense;
mod money;

pub use budget::*;
pub use category::*;
pub use expense::*;
pub use money::*;
