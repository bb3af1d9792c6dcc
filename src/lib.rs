//! Core library functions for the graph anonymizer
//!
//! Tables of generalizable values are made k-anonymous by grouping similar
//! rows through a minimum-cost forest and generalizing every group to its
//! lowest common partitions.

pub mod anonymize;
pub mod config;
pub mod data;
pub mod error;
pub mod generalization;
pub mod graph;
pub mod model;
pub mod partition;
pub mod storage;

#[cfg(test)]
mod fixtures;

pub use anonymize::{anonymize, AnonymizationReport, Anonymizer, RowGroup};
pub use config::Config;
pub use error::{AnonError, Result};
