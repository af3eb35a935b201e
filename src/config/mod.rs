//! Configuration types for batch runs.
//!
//! This module provides:
//! - `BatchConfig`: Sizes, names and formats of one job
//! - `OutputConfig`: Where each destination's file is placed

mod batch;
mod output;

pub use batch::BatchConfig;
pub use output::OutputConfig;
