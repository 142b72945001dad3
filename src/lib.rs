//! receiptfold - receipt analysis and family shopping list consolidation.
//!
//! Ingests OCR text from shopping receipts, asks an extraction model to
//! structure it into per-store item lists, and folds the result into a
//! family's cumulative shopping list with a notification at the end.

pub mod cli;
pub mod config;
pub mod llm;
pub mod merge;
pub mod models;
pub mod notify;
pub mod repository;
pub mod services;
pub mod stores;
