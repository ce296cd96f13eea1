//! Domain models for the search core.

mod catalog;
mod context;
mod suggestion;

pub use catalog::*;
pub use context::*;
pub use suggestion::*;
