//! JSON lines format implementation.

use super::{FormatError, FormatKind, LineFormat};
use crate::record::Record;

/// One compact JSON object per record:
/// `{"id":2,"firstName":"B","lastName":"Y","birthdate":"1991-02-02"}`.
///
/// Field order follows the record's declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesFormat;

impl LineFormat for JsonLinesFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::JsonLines
    }

    fn format(&self, record: &Record) -> Result<String, FormatError> {
        serde_json::to_string(record).map_err(|e| FormatError::Serde(Box::new(e)))
    }

    fn parse(&self, line: &str) -> Result<Record, FormatError> {
        serde_json::from_str(line).map_err(|e| FormatError::Serde(Box::new(e)))
    }
}
