//! Item writers.
//!
//! This module provides:
//! - `FlatFileWriter`: Formats records into lines on one output target
//! - `ClassifierCompositeWriter`: Routes each record to one of several
//!   writers by classification key and drives them as one resource group

mod composite;
mod flat_file;

pub use composite::ClassifierCompositeWriter;
pub use flat_file::FlatFileWriter;
