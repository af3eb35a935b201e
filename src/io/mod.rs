//! Output targets and their per-run allocation.
//!
//! This module provides:
//! - `OutputTarget`: Trait for output destinations
//! - `FileOutput`: A file on disk
//! - `InMemorySink`: An in-memory buffer for testing
//! - `OutputResolver`: Allocation of a fresh target per destination per run

mod memory;
mod output;
mod resolver;
mod std_io;

pub use memory::InMemorySink;
pub use output::{FileExistsPolicy, OutputTarget};
pub use resolver::{DirResolver, MemoryResolver, OutputResolver, TempFileResolver};
pub use std_io::FileOutput;
