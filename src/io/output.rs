//! Output target trait definition.

use std::fmt::Debug;
use std::io::Write;

use serde::{Deserialize, Serialize};

/// Policy for handling existing output content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileExistsPolicy {
    /// Overwrite existing files
    #[default]
    Overwrite,
    /// Append to existing files
    Append,
    /// Return an error if the target already exists
    Error,
}

/// Trait for synchronous output targets.
///
/// Implementors provide a way to open a writable stream to various destinations
/// such as files or in-memory buffers.
pub trait OutputTarget: Send + Sync + Debug {
    /// Returns a unique identifier for this output target.
    ///
    /// This is used for error messages and logging.
    /// Convention: file path for files.
    fn id(&self) -> &str;

    /// Open the target for writing, truncating any existing content.
    fn open_overwrite(&self) -> std::io::Result<Box<dyn Write + Send>>;

    /// Open the target for appending to existing content.
    fn open_append(&self) -> std::io::Result<Box<dyn Write + Send>>;

    /// Open the target, failing with `AlreadyExists` if it has content.
    fn open_new(&self) -> std::io::Result<Box<dyn Write + Send>>;

    /// Current length of the target in bytes.
    fn size(&self) -> std::io::Result<u64>;

    /// Cut the target back to `size` bytes.
    ///
    /// Streams returned by the `open_*` methods always write at the end, so
    /// writing after a truncate continues from the new end.
    fn truncate(&self, size: u64) -> std::io::Result<()>;

    /// Open according to `policy`.
    fn open_with(&self, policy: FileExistsPolicy) -> std::io::Result<Box<dyn Write + Send>> {
        match policy {
            FileExistsPolicy::Overwrite => self.open_overwrite(),
            FileExistsPolicy::Append => self.open_append(),
            FileExistsPolicy::Error => self.open_new(),
        }
    }
}
