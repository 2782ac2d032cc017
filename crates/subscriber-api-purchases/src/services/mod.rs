//! Batch splitting and reconciliation.

pub mod batch_parser;
pub mod reconciler;
