//! Service layer for receiptfold business logic.
//!
//! Domain logic separated from UI concerns. Services can be used by the
//! CLI, a queue consumer, or other interfaces.

pub mod analysis;

pub use analysis::{AnalysisError, AnalysisOutcome, AnalysisService};
