//! Table input

pub mod json;

pub use json::{load_table, parse_table, TableDocument};
